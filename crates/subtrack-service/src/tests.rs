//! Flow tests against the in-memory store.

use std::sync::Arc;

use subtrack_auth::{CredentialVerifier, TokenService, token::DEFAULT_TTL};
use subtrack_core::{
  Error, OwnerId, memory::MemoryStore, subscription::SubscriptionInput,
};
use uuid::Uuid;

use crate::{AuthFlow, SubscriptionFlow};

struct Harness {
  auth:   AuthFlow<MemoryStore>,
  subs:   SubscriptionFlow<MemoryStore>,
  tokens: Arc<TokenService>,
}

fn harness() -> Harness {
  let store = Arc::new(MemoryStore::new());
  let tokens = Arc::new(TokenService::new(b"flow-test-secret", DEFAULT_TTL).unwrap());
  let verifier = CredentialVerifier::with_cost(1024, 1, 1).unwrap();
  Harness {
    auth: AuthFlow::new(store.clone(), verifier, tokens.clone()),
    subs: SubscriptionFlow::new(store),
    tokens,
  }
}

impl Harness {
  async fn owner(&self, email: &str) -> OwnerId {
    let result = self.auth.register("Test", email, "longenough1").await.unwrap();
    self.tokens.validate(&result.token).unwrap()
  }
}

fn netflix() -> SubscriptionInput {
  SubscriptionInput {
    service_name:  "Netflix".into(),
    bank_name:     "Chase".into(),
    card_last4:    "4242".into(),
    billing_cycle: "yearly".into(),
    charge_date:   "2025-01-10".into(),
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_login_yields_valid_tokens() {
  let h = harness();

  let registered = h
    .auth
    .register("  Ana ", "Ana@x.com", "longenough1")
    .await
    .unwrap();
  assert_eq!(registered.user.name, "Ana");
  assert_eq!(registered.user.email, "ana@x.com");
  assert_ne!(registered.user.password_hash, "longenough1");

  let logged_in = h.auth.login(" ANA@X.COM ", "longenough1").await.unwrap();
  assert_eq!(logged_in.user.id, registered.user.id);

  let owner = h.tokens.validate(&logged_in.token).unwrap();
  assert_eq!(owner.as_uuid(), registered.user.id);
}

#[tokio::test]
async fn duplicate_email_in_any_case_is_rejected() {
  let h = harness();
  h.auth.register("Ana", "ana@x.com", "longenough1").await.unwrap();

  for email in ["ana@x.com", "ANA@X.COM", " Ana@x.com "] {
    let err = h.auth.register("Other", email, "longenough2").await.unwrap_err();
    assert!(matches!(err, Error::DuplicateEmail), "{email}: {err:?}");
  }
}

#[tokio::test]
async fn register_validates_input() {
  let h = harness();
  let cases = [
    ("", "ana@x.com", "longenough1"),
    ("   ", "ana@x.com", "longenough1"),
    ("Ana", "  ", "longenough1"),
    ("Ana", "ana@x.com", "short"),
    ("Ana", "ana@x.com", "1234567"),
  ];
  for (name, email, password) in cases {
    let err = h.auth.register(name, email, password).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "{name:?} {email:?} {password:?}");
  }

  // Exactly eight characters is enough.
  h.auth.register("Ana", "ana@x.com", "12345678").await.unwrap();
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
  let h = harness();
  h.auth.register("Ana", "ana@x.com", "longenough1").await.unwrap();

  let wrong_password = h.auth.login("ana@x.com", "longenough2").await.unwrap_err();
  let unknown_email = h.auth.login("bob@x.com", "longenough1").await.unwrap_err();

  assert!(matches!(wrong_password, Error::Unauthorized));
  assert!(matches!(unknown_email, Error::Unauthorized));
  assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn login_requires_email_and_password() {
  let h = harness();
  for (email, password) in [("", "longenough1"), ("ana@x.com", "")] {
    let err = h.auth.login(email, password).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
  }
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_echoes_normalised_input() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;

  let mut input = netflix();
  input.billing_cycle = "Monthly".into();
  input.charge_date = "2024-03-15".into();

  let sub = h.subs.create(ana, &input).await.unwrap();
  assert_eq!(sub.owner_id, ana);
  assert_eq!(sub.details.billing_cycle.as_str(), "monthly");
  assert_eq!(sub.details.charge_date.to_string(), "2024-03-15");

  let listed = h.subs.list(ana).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].id, sub.id);
}

#[tokio::test]
async fn invalid_input_writes_nothing() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;

  let mut inputs = Vec::new();
  for card in ["424", "42424"] {
    let mut input = netflix();
    input.card_last4 = card.into();
    inputs.push(input);
  }
  let mut weekly = netflix();
  weekly.billing_cycle = "weekly".into();
  inputs.push(weekly);
  let mut bad_date = netflix();
  bad_date.charge_date = "2024-13-01".into();
  inputs.push(bad_date);

  for input in &inputs {
    let err = h.subs.create(ana, input).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "{input:?}");
  }
  assert!(h.subs.list(ana).await.unwrap().is_empty());
}

#[tokio::test]
async fn other_users_cannot_see_or_touch_a_subscription() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;
  let bob = h.owner("bob@x.com").await;

  let sub = h.subs.create(ana, &netflix()).await.unwrap();
  let id = sub.id.to_string();

  assert!(h.subs.list(bob).await.unwrap().is_empty());

  let err = h.subs.update(bob, &id, &netflix()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound));

  let err = h.subs.delete(bob, &id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound));

  // Still intact for its owner.
  let listed = h.subs.list(ana).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].details.service_name, "Netflix");
}

#[tokio::test]
async fn missing_and_foreign_ids_get_the_same_signal() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;

  for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
    assert!(matches!(h.subs.delete(ana, &id).await, Err(Error::NotFound)));
    assert!(matches!(
      h.subs.update(ana, &id, &netflix()).await,
      Err(Error::NotFound)
    ));
  }
}

#[tokio::test]
async fn blank_target_id_is_invalid_input() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;

  assert!(matches!(h.subs.delete(ana, "  ").await, Err(Error::InvalidInput(_))));
  assert!(matches!(
    h.subs.update(ana, "", &netflix()).await,
    Err(Error::InvalidInput(_))
  ));
}

#[tokio::test]
async fn malformed_body_is_reported_before_the_target_id() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;

  let mut input = netflix();
  input.card_last4 = "42".into();
  for id in ["not-a-uuid".to_string(), Uuid::new_v4().to_string(), String::new()] {
    let err = h.subs.update(ana, &id, &input).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "{id:?}: {err:?}");
  }
}

#[tokio::test]
async fn owner_can_update_and_delete() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;
  let sub = h.subs.create(ana, &netflix()).await.unwrap();

  let mut changed = netflix();
  changed.bank_name = "Amex".into();
  changed.charge_date = "2025-02-10".into();
  let updated = h.subs.update(ana, &sub.id.to_string(), &changed).await.unwrap();
  assert_eq!(updated.id, sub.id);
  assert_eq!(updated.details.bank_name, "Amex");
  assert!(updated.updated_at >= sub.updated_at);

  let deleted = h.subs.delete(ana, &sub.id.to_string()).await.unwrap();
  assert_eq!(deleted, sub.id);
  assert!(h.subs.list(ana).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_owner_is_unauthorized() {
  let h = harness();
  let nobody = OwnerId::new(Uuid::nil());

  assert!(matches!(h.subs.list(nobody).await, Err(Error::Unauthorized)));
  assert!(matches!(h.subs.create(nobody, &netflix()).await, Err(Error::Unauthorized)));
  assert!(matches!(
    h.subs.update(nobody, &Uuid::new_v4().to_string(), &netflix()).await,
    Err(Error::Unauthorized)
  ));
  assert!(matches!(
    h.subs.delete(nobody, &Uuid::new_v4().to_string()).await,
    Err(Error::Unauthorized)
  ));
}

#[tokio::test]
async fn list_is_ordered_by_charge_date() {
  let h = harness();
  let ana = h.owner("ana@x.com").await;

  for date in ["2025-03-01", "2024-12-31", "2025-01-15"] {
    let mut input = netflix();
    input.charge_date = date.into();
    h.subs.create(ana, &input).await.unwrap();
  }

  let dates: Vec<String> = h
    .subs
    .list(ana)
    .await
    .unwrap()
    .iter()
    .map(|s| s.details.charge_date.to_string())
    .collect();
  assert_eq!(dates, ["2024-12-31", "2025-01-15", "2025-03-01"]);
}
