//! Conversions between domain types and the plain-text SQLite columns.
//!
//! Timestamps are RFC 3339 UTC with a fixed microsecond precision so they
//! sort lexically. Charge dates are `YYYY-MM-DD`. UUIDs are hyphenated
//! lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use subtrack_core::{
  OwnerId,
  subscription::{
    BillingCycle, CHARGE_DATE_FORMAT, Subscription, SubscriptionDetails,
  },
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// The current time at the precision the columns keep.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String {
  d.format(CHARGE_DATE_FORMAT).to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, CHARGE_DATE_FORMAT)
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_billing_cycle(s: &str) -> Result<BillingCycle> {
  match s {
    "monthly" => Ok(BillingCycle::Monthly),
    "yearly" => Ok(BillingCycle::Yearly),
    other => Err(Error::BillingCycle(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

/// Raw strings read from a `users` row.
pub struct RawUser {
  pub id:            String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  /// Read a row selected with [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn decode(self) -> Result<User> {
    Ok(User {
      id:            decode_uuid(&self.id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str = "id, user_id, service_name, bank_name, \
                                        card_last4, billing_cycle, charge_date, \
                                        created_at, updated_at";

/// Raw strings read from a `subscriptions` row.
pub struct RawSubscription {
  pub id:            String,
  pub user_id:       String,
  pub service_name:  String,
  pub bank_name:     String,
  pub card_last4:    String,
  pub billing_cycle: String,
  pub charge_date:   String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawSubscription {
  /// Read a row selected (or returned) with [`SUBSCRIPTION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      user_id:       row.get(1)?,
      service_name:  row.get(2)?,
      bank_name:     row.get(3)?,
      card_last4:    row.get(4)?,
      billing_cycle: row.get(5)?,
      charge_date:   row.get(6)?,
      created_at:    row.get(7)?,
      updated_at:    row.get(8)?,
    })
  }

  pub fn decode(self) -> Result<Subscription> {
    Ok(Subscription {
      id:         decode_uuid(&self.id)?,
      owner_id:   OwnerId::new(decode_uuid(&self.user_id)?),
      details:    SubscriptionDetails {
        service_name:  self.service_name,
        bank_name:     self.bank_name,
        card_last4:    self.card_last4,
        billing_cycle: decode_billing_cycle(&self.billing_cycle)?,
        charge_date:   decode_date(&self.charge_date)?,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
