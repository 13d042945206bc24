//! [`MemoryStore`]: a process-local store for tests and experiments.
//!
//! Holds both tables behind one mutex, so every operation is atomic with
//! respect to every other.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, OwnerId, Result,
  store::{AccountDirectory, SubscriptionLedger},
  subscription::{NewSubscription, Subscription, SubscriptionUpdate},
  user::{NewUser, User},
};

#[derive(Default)]
struct Tables {
  users:         Vec<User>,
  subscriptions: Vec<Subscription>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn tables(&self) -> MutexGuard<'_, Tables> {
    self.tables.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl AccountDirectory for MemoryStore {
  async fn create_user(&self, input: NewUser) -> Result<User> {
    let mut tables = self.tables();

    if tables
      .users
      .iter()
      .any(|u| u.email.eq_ignore_ascii_case(&input.email))
    {
      return Err(Error::DuplicateEmail);
    }

    let user = User {
      id:            Uuid::new_v4(),
      name:          input.name,
      email:         input.email,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };
    tables.users.push(user.clone());
    Ok(user)
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(
      self
        .tables()
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .cloned(),
    )
  }
}

impl SubscriptionLedger for MemoryStore {
  async fn list_by_owner(&self, owner: OwnerId) -> Result<Vec<Subscription>> {
    let mut subs: Vec<Subscription> = self
      .tables()
      .subscriptions
      .iter()
      .filter(|s| s.owner_id == owner)
      .cloned()
      .collect();
    subs.sort_by(|a, b| {
      (a.details.charge_date, a.created_at, a.id)
        .cmp(&(b.details.charge_date, b.created_at, b.id))
    });
    Ok(subs)
  }

  async fn create_subscription(&self, input: NewSubscription) -> Result<Subscription> {
    let mut tables = self.tables();

    // Mirrors the foreign key of the SQL backends.
    if !tables.users.iter().any(|u| u.owner_id() == input.owner_id) {
      return Err(Error::internal(format!(
        "owner {} does not exist",
        input.owner_id
      )));
    }

    let now = Utc::now();
    let sub = Subscription {
      id:         Uuid::new_v4(),
      owner_id:   input.owner_id,
      details:    input.details,
      created_at: now,
      updated_at: now,
    };
    tables.subscriptions.push(sub.clone());
    Ok(sub)
  }

  async fn update_subscription(&self, input: SubscriptionUpdate) -> Result<Subscription> {
    let mut tables = self.tables();
    let sub = tables
      .subscriptions
      .iter_mut()
      .find(|s| s.id == input.id && s.owner_id == input.owner_id)
      .ok_or(Error::NotFound)?;

    sub.details = input.details;
    sub.updated_at = Utc::now();
    Ok(sub.clone())
  }

  async fn delete_subscription(&self, owner: OwnerId, id: Uuid) -> Result<()> {
    let mut tables = self.tables();
    let before = tables.subscriptions.len();
    tables
      .subscriptions
      .retain(|s| !(s.id == id && s.owner_id == owner));

    if tables.subscriptions.len() == before {
      return Err(Error::NotFound);
    }
    Ok(())
  }
}
