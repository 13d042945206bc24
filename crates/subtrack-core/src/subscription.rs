//! Subscription records and the validation applied before any storage call.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, OwnerId, Result};

/// Wire and storage format of a charge date.
pub const CHARGE_DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Billing cycle ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
  Monthly,
  Yearly,
}

impl BillingCycle {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Monthly => "monthly",
      Self::Yearly => "yearly",
    }
  }
}

impl fmt::Display for BillingCycle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BillingCycle {
  type Err = Error;

  /// Case-insensitive; surrounding whitespace is ignored.
  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "monthly" => Ok(Self::Monthly),
      "yearly" => Ok(Self::Yearly),
      _ => Err(Error::invalid("billing_cycle must be \"monthly\" or \"yearly\"")),
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// The user-editable part of a subscription, already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionDetails {
  pub service_name:  String,
  pub bank_name:     String,
  pub card_last4:    String,
  pub billing_cycle: BillingCycle,
  pub charge_date:   NaiveDate,
}

/// A persisted subscription. The owner is kept server-side only.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
  pub id:         Uuid,
  #[serde(skip)]
  pub owner_id:   OwnerId,
  #[serde(flatten)]
  pub details:    SubscriptionDetails,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::SubscriptionLedger::create_subscription`].
#[derive(Debug, Clone)]
pub struct NewSubscription {
  pub owner_id: OwnerId,
  pub details:  SubscriptionDetails,
}

/// Input to [`crate::store::SubscriptionLedger::update_subscription`].
/// Matches only when both `id` and `owner_id` agree with the stored row.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdate {
  pub id:       Uuid,
  pub owner_id: OwnerId,
  pub details:  SubscriptionDetails,
}

// ─── Raw input ───────────────────────────────────────────────────────────────

/// Untrusted subscription fields as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubscriptionInput {
  pub service_name:  String,
  pub bank_name:     String,
  pub card_last4:    String,
  pub billing_cycle: String,
  pub charge_date:   String,
}

impl SubscriptionInput {
  /// Trim, normalise and check every field.
  pub fn validate(&self) -> Result<SubscriptionDetails> {
    let service_name = self.service_name.trim();
    if service_name.is_empty() {
      return Err(Error::invalid("service_name is required"));
    }

    let bank_name = self.bank_name.trim();
    if bank_name.is_empty() {
      return Err(Error::invalid("bank_name is required"));
    }

    let card_last4 = self.card_last4.trim();
    if card_last4.chars().count() != 4 {
      return Err(Error::invalid("card_last4 must be exactly 4 characters"));
    }

    let billing_cycle = self.billing_cycle.parse::<BillingCycle>()?;
    let charge_date = parse_charge_date(&self.charge_date)?;

    Ok(SubscriptionDetails {
      service_name: service_name.to_owned(),
      bank_name: bank_name.to_owned(),
      card_last4: card_last4.to_owned(),
      billing_cycle,
      charge_date,
    })
  }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// chrono accepts unpadded fields, so the shape is checked before parsing.
pub fn parse_charge_date(raw: &str) -> Result<NaiveDate> {
  let raw = raw.trim();
  let invalid = || Error::invalid("charge_date must be a YYYY-MM-DD date");

  let well_formed = raw.len() == 10
    && raw.bytes().enumerate().all(|(i, b)| match i {
      4 | 7 => b == b'-',
      _ => b.is_ascii_digit(),
    });
  if !well_formed {
    return Err(invalid());
  }

  NaiveDate::parse_from_str(raw, CHARGE_DATE_FORMAT).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input() -> SubscriptionInput {
    SubscriptionInput {
      service_name:  "Netflix".into(),
      bank_name:     "Chase".into(),
      card_last4:    "4242".into(),
      billing_cycle: "yearly".into(),
      charge_date:   "2025-01-10".into(),
    }
  }

  fn assert_invalid(input: SubscriptionInput) {
    assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));
  }

  #[test]
  fn valid_input_is_normalised() {
    let mut raw = input();
    raw.service_name = "  Netflix ".into();
    raw.billing_cycle = " Monthly ".into();
    raw.charge_date = "2024-03-15".into();

    let details = raw.validate().unwrap();
    assert_eq!(details.service_name, "Netflix");
    assert_eq!(details.billing_cycle, BillingCycle::Monthly);
    assert_eq!(details.charge_date.to_string(), "2024-03-15");
  }

  #[test]
  fn blank_names_are_rejected() {
    let mut raw = input();
    raw.service_name = "   ".into();
    assert_invalid(raw);

    let mut raw = input();
    raw.bank_name = String::new();
    assert_invalid(raw);
  }

  #[test]
  fn card_last4_must_be_four_characters() {
    for card in ["424", "42424", ""] {
      let mut raw = input();
      raw.card_last4 = card.into();
      assert_invalid(raw);
    }

    let mut raw = input();
    raw.card_last4 = " 4242 ".into();
    assert_eq!(raw.validate().unwrap().card_last4, "4242");
  }

  #[test]
  fn unknown_billing_cycle_is_rejected() {
    let mut raw = input();
    raw.billing_cycle = "weekly".into();
    assert_invalid(raw);
  }

  #[test]
  fn charge_date_must_be_a_real_iso_date() {
    for date in ["2024-13-01", "2024-02-30", "2024-3-15", "15/03/2024", ""] {
      let mut raw = input();
      raw.charge_date = date.into();
      assert_invalid(raw);
    }
  }

  #[test]
  fn input_rejects_unknown_fields() {
    let body = r#"{"service_name":"x","user_id":"someone-else"}"#;
    assert!(serde_json::from_str::<SubscriptionInput>(body).is_err());
  }

  #[test]
  fn subscription_serializes_without_owner() {
    let sub = Subscription {
      id:         Uuid::new_v4(),
      owner_id:   OwnerId::new(Uuid::new_v4()),
      details:    input().validate().unwrap(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    };
    let json = serde_json::to_value(&sub).unwrap();
    assert!(json.get("owner_id").is_none());
    assert_eq!(json["billing_cycle"], "yearly");
    assert_eq!(json["charge_date"], "2025-01-10");
    assert_eq!(json["card_last4"], "4242");
  }
}
