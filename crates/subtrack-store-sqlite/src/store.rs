//! [`SqliteStore`]: the SQLite implementation of the storage traits.

use std::{path::Path, time::Duration};

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use subtrack_core::{
  OwnerId,
  store::{AccountDirectory, SubscriptionLedger},
  subscription::{NewSubscription, Subscription, SubscriptionUpdate},
  user::{NewUser, User},
};

use crate::{
  Result,
  encode::{
    RawSubscription, RawUser, SUBSCRIPTION_COLUMNS, USER_COLUMNS, encode_date,
    encode_dt, encode_uuid, now,
  },
  pool::{Pool, Target},
  schema,
};

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoreConfig {
  /// Number of pooled connections. Must be at least 1.
  pub pool_size:     u32,
  /// Deadline for one storage call, pool wait included.
  pub query_timeout: Duration,
  /// How long SQLite itself retries on a locked database.
  pub busy_timeout:  Duration,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      pool_size:     4,
      query_timeout: Duration::from_secs(5),
      busy_timeout:  Duration::from_secs(5),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Accounts and subscriptions in a single SQLite file.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct SqliteStore {
  pool: Pool,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and apply pending migrations.
  ///
  /// `:memory:` (or an empty path) opens a private database that exists only
  /// on the connection that created it, so the pool is held to one
  /// connection in that case.
  pub async fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
    let path = path.as_ref();
    let (target, size) = if is_memory_path(path) {
      if config.pool_size > 1 {
        tracing::warn!(
          pool_size = config.pool_size,
          "in-memory database, using a single connection"
        );
      }
      (Target::Memory, 1)
    } else {
      (Target::file(path), config.pool_size)
    };
    let pool =
      Pool::open(target, size, config.query_timeout, config.busy_timeout).await?;
    Self::init(pool).await
  }

  /// Open a private in-memory store with a single connection.
  pub async fn open_in_memory() -> Result<Self> {
    let config = StoreConfig::default();
    let pool =
      Pool::open(Target::Memory, 1, config.query_timeout, config.busy_timeout)
        .await?;
    Self::init(pool).await
  }

  async fn init(pool: Pool) -> Result<Self> {
    let applied = pool
      .call(|conn| {
        schema::migrate(conn).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
      })
      .await?;
    for name in applied {
      tracing::info!(migration = name, "applied migration");
    }
    Ok(Self { pool })
  }

  /// Wait for in-flight calls, then close every connection.
  pub async fn close(&self) -> Result<()> { self.pool.close().await }

  async fn insert_user(&self, user: User) -> Result<Option<User>> {
    let id_str = encode_uuid(user.id);
    let at_str = encode_dt(user.created_at);
    let name = user.name.clone();
    let email = user.email.clone();
    let hash = user.password_hash.clone();

    let inserted = self
      .pool
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO users (id, name, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, email, hash, at_str],
        );
        match result {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(inserted.then_some(user))
  }

  async fn select_user_by_email(&self, email: String) -> Result<Option<User>> {
    let raw = self
      .pool
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              rusqlite::params![email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::decode).transpose()
  }

  async fn select_subscriptions(&self, owner: OwnerId) -> Result<Vec<Subscription>> {
    let owner_str = encode_uuid(owner.as_uuid());
    let rows = self
      .pool
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE user_id = ?1
           ORDER BY charge_date ASC, created_at ASC, id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows.into_iter().map(RawSubscription::decode).collect()
  }

  async fn insert_subscription(&self, sub: Subscription) -> Result<Subscription> {
    let id_str = encode_uuid(sub.id);
    let owner_str = encode_uuid(sub.owner_id.as_uuid());
    let service_name = sub.details.service_name.clone();
    let bank_name = sub.details.bank_name.clone();
    let card_last4 = sub.details.card_last4.clone();
    let cycle = sub.details.billing_cycle.as_str();
    let charge_date = encode_date(sub.details.charge_date);
    let created_str = encode_dt(sub.created_at);
    let updated_str = encode_dt(sub.updated_at);

    self
      .pool
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (
             id, user_id, service_name, bank_name, card_last4,
             billing_cycle, charge_date, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            owner_str,
            service_name,
            bank_name,
            card_last4,
            cycle,
            charge_date,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(sub)
  }

  async fn update_owned(&self, input: SubscriptionUpdate) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(input.id);
    let owner_str = encode_uuid(input.owner_id.as_uuid());
    let details = input.details;
    let cycle = details.billing_cycle.as_str();
    let charge_date = encode_date(details.charge_date);
    let updated_str = encode_dt(now());

    let raw = self
      .pool
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE subscriptions
                 SET service_name = ?1, bank_name = ?2, card_last4 = ?3,
                     billing_cycle = ?4, charge_date = ?5, updated_at = ?6
                 WHERE id = ?7 AND user_id = ?8
                 RETURNING {SUBSCRIPTION_COLUMNS}"
              ),
              rusqlite::params![
                details.service_name,
                details.bank_name,
                details.card_last4,
                cycle,
                charge_date,
                updated_str,
                id_str,
                owner_str,
              ],
              RawSubscription::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSubscription::decode).transpose()
  }

  async fn delete_owned(&self, owner: OwnerId, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let owner_str = encode_uuid(owner.as_uuid());
    let removed = self
      .pool
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }
}

fn is_memory_path(path: &Path) -> bool {
  path.as_os_str().is_empty() || path == Path::new(":memory:")
}

// ─── AccountDirectory impl ───────────────────────────────────────────────────

impl AccountDirectory for SqliteStore {
  async fn create_user(&self, input: NewUser) -> subtrack_core::Result<User> {
    let user = User {
      id:            Uuid::new_v4(),
      name:          input.name,
      email:         input.email,
      password_hash: input.password_hash,
      created_at:    now(),
    };
    self
      .insert_user(user)
      .await?
      .ok_or(subtrack_core::Error::DuplicateEmail)
  }

  async fn find_by_email(&self, email: &str) -> subtrack_core::Result<Option<User>> {
    Ok(self.select_user_by_email(email.to_owned()).await?)
  }
}

// ─── SubscriptionLedger impl ─────────────────────────────────────────────────

impl SubscriptionLedger for SqliteStore {
  async fn list_by_owner(
    &self,
    owner: OwnerId,
  ) -> subtrack_core::Result<Vec<Subscription>> {
    Ok(self.select_subscriptions(owner).await?)
  }

  async fn create_subscription(
    &self,
    input: NewSubscription,
  ) -> subtrack_core::Result<Subscription> {
    let at = now();
    let sub = Subscription {
      id:         Uuid::new_v4(),
      owner_id:   input.owner_id,
      details:    input.details,
      created_at: at,
      updated_at: at,
    };
    Ok(self.insert_subscription(sub).await?)
  }

  async fn update_subscription(
    &self,
    input: SubscriptionUpdate,
  ) -> subtrack_core::Result<Subscription> {
    self
      .update_owned(input)
      .await?
      .ok_or(subtrack_core::Error::NotFound)
  }

  async fn delete_subscription(
    &self,
    owner: OwnerId,
    id: Uuid,
  ) -> subtrack_core::Result<()> {
    if self.delete_owned(owner, id).await? {
      Ok(())
    } else {
      Err(subtrack_core::Error::NotFound)
    }
  }
}
