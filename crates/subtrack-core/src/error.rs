//! The business error taxonomy shared by every layer.
//!
//! Flows produce these kinds deliberately and the HTTP boundary maps each one
//! to a status code. Storage and signing failures are folded into
//! [`Error::Internal`] or [`Error::Timeout`] before they reach a flow.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing input; the caller must correct the request.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// Missing, invalid or expired identity, or a failed credential check.
  #[error("unauthorized")]
  Unauthorized,

  /// The target record is absent or belongs to someone else.
  #[error("not found")]
  NotFound,

  #[error("email already registered")]
  DuplicateEmail,

  /// A storage call exceeded its deadline. Safe to retry.
  #[error("operation timed out")]
  Timeout,

  #[error("internal error: {0}")]
  Internal(#[source] BoxError),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidInput(message.into())
  }

  pub fn internal(source: impl Into<BoxError>) -> Self {
    Self::Internal(source.into())
  }

  /// Whether the caller may retry the same request unchanged.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::Timeout | Self::Internal(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
