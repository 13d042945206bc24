//! Storage traits for accounts and subscriptions.
//!
//! Implemented by storage backends (e.g. `subtrack-store-sqlite`) and by the
//! in-memory [`crate::memory::MemoryStore`]. The flows depend on these
//! abstractions, never on a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used behind `axum`
//! handlers on a multi-threaded runtime.

use std::future::Future;

use uuid::Uuid;

use crate::{
  OwnerId, Result,
  subscription::{NewSubscription, Subscription, SubscriptionUpdate},
  user::{NewUser, User},
};

/// Persistence of user accounts.
pub trait AccountDirectory: Send + Sync {
  /// Persist a new account.
  ///
  /// Fails with [`Error::DuplicateEmail`](crate::Error::DuplicateEmail) when
  /// the email is taken in any letter case. The check and the insert are a
  /// single atomic step in the backend.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  /// Look up an account by (already normalised) email. `None` if absent.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>>> + Send + 'a;
}

/// Persistence of subscriptions, always scoped to one owner.
pub trait SubscriptionLedger: Send + Sync {
  /// All subscriptions of `owner`, ordered by charge date ascending.
  fn list_by_owner(
    &self,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Vec<Subscription>>> + Send + '_;

  /// Persist a subscription; the store assigns `id` and the timestamps.
  fn create_subscription(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription>> + Send + '_;

  /// Replace the details of the subscription matching both `id` and owner.
  ///
  /// Fails with [`Error::NotFound`](crate::Error::NotFound) when no row
  /// matches, whether it is absent or owned by someone else.
  fn update_subscription(
    &self,
    input: SubscriptionUpdate,
  ) -> impl Future<Output = Result<Subscription>> + Send + '_;

  /// Delete the subscription matching both `id` and `owner`.
  ///
  /// Fails with [`Error::NotFound`](crate::Error::NotFound) when no row was
  /// removed.
  fn delete_subscription(
    &self,
    owner: OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;
}
