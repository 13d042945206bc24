//! Error types for `subtrack-auth`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
  #[error("entropy source failure: {0}")]
  Entropy(String),

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("invalid hashing cost: {0}")]
  Cost(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
  /// Rejected token. Deliberately carries no reason.
  #[error("invalid token")]
  Invalid,

  #[error("token signing failed: {0}")]
  Signing(#[source] jsonwebtoken::errors::Error),

  #[error("token service misconfigured: {0}")]
  Configuration(String),
}

impl From<CredentialError> for subtrack_core::Error {
  fn from(e: CredentialError) -> Self { Self::internal(e) }
}

impl From<TokenError> for subtrack_core::Error {
  fn from(e: TokenError) -> Self {
    match e {
      TokenError::Invalid => Self::Unauthorized,
      other => Self::internal(other),
    }
  }
}
