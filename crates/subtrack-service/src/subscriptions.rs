//! Owner-scoped subscription lifecycle.
//!
//! The owner is always the [`OwnerId`] argument. Nothing in
//! [`SubscriptionInput`] can name a different owner.

use std::sync::Arc;

use subtrack_core::{
  Error, OwnerId, Result,
  store::SubscriptionLedger,
  subscription::{
    NewSubscription, Subscription, SubscriptionInput, SubscriptionUpdate,
  },
};
use uuid::Uuid;

pub struct SubscriptionFlow<L> {
  ledger: Arc<L>,
}

impl<L: SubscriptionLedger> SubscriptionFlow<L> {
  pub fn new(ledger: Arc<L>) -> Self { Self { ledger } }

  pub async fn list(&self, owner: OwnerId) -> Result<Vec<Subscription>> {
    require_owner(owner)?;
    self.ledger.list_by_owner(owner).await
  }

  pub async fn create(
    &self,
    owner: OwnerId,
    input: &SubscriptionInput,
  ) -> Result<Subscription> {
    require_owner(owner)?;
    let details = input.validate()?;

    let sub = self
      .ledger
      .create_subscription(NewSubscription { owner_id: owner, details })
      .await?;
    tracing::info!(owner = %owner, subscription_id = %sub.id, "created subscription");
    Ok(sub)
  }

  pub async fn update(
    &self,
    owner: OwnerId,
    id: &str,
    input: &SubscriptionInput,
  ) -> Result<Subscription> {
    require_owner(owner)?;
    let details = input.validate()?;
    let id = parse_target(id)?;

    self
      .ledger
      .update_subscription(SubscriptionUpdate { id, owner_id: owner, details })
      .await
  }

  pub async fn delete(&self, owner: OwnerId, id: &str) -> Result<Uuid> {
    require_owner(owner)?;
    let id = parse_target(id)?;

    self.ledger.delete_subscription(owner, id).await?;
    tracing::info!(owner = %owner, subscription_id = %id, "deleted subscription");
    Ok(id)
  }
}

fn require_owner(owner: OwnerId) -> Result<()> {
  if owner.is_empty() {
    return Err(Error::Unauthorized);
  }
  Ok(())
}

/// A blank identifier is malformed input. A non-UUID cannot name any row, so
/// it gets the same `NotFound` as an id owned by someone else.
fn parse_target(raw: &str) -> Result<Uuid> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Err(Error::invalid("subscription id is required"));
  }
  Uuid::parse_str(raw).map_err(|_| Error::NotFound)
}
