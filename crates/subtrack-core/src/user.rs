//! User accounts and the owner identity threaded through every flow.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── OwnerId ─────────────────────────────────────────────────────────────────

/// The identity of an authenticated caller.
///
/// Produced by token validation at the HTTP boundary and passed explicitly to
/// every subscription operation. The nil UUID is treated as "no identity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
  pub fn new(id: Uuid) -> Self { Self(id) }

  pub fn as_uuid(&self) -> Uuid { self.0 }

  pub fn is_empty(&self) -> bool { self.0.is_nil() }
}

impl From<Uuid> for OwnerId {
  fn from(id: Uuid) -> Self { Self(id) }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A registered account. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct User {
  pub id:            Uuid,
  pub name:          String,
  /// Always stored lowercased.
  pub email:         String,
  /// Argon2 PHC string. Never leaves the server.
  #[serde(skip)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn owner_id(&self) -> OwnerId { OwnerId(self.id) }
}

/// Input to [`crate::store::AccountDirectory::create_user`].
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
}

/// Trim and lowercase an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}
