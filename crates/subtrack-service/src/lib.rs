//! Business flows: registration/login and owner-scoped subscription CRUD.
//!
//! Flows are generic over the storage traits in `subtrack_core::store` and
//! take the caller's identity as an explicit [`OwnerId`] argument.
//!
//! [`OwnerId`]: subtrack_core::OwnerId

pub mod auth;
pub mod subscriptions;

pub use auth::{AuthFlow, AuthResult};
pub use subscriptions::SubscriptionFlow;

#[cfg(test)]
mod tests;
