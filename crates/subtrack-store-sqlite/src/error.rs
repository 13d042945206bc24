//! Error type for `subtrack-store-sqlite`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown billing cycle in row: {0:?}")]
  BillingCycle(String),

  #[error("migration {name} failed: {source}")]
  Migration {
    name:   &'static str,
    #[source]
    source: rusqlite::Error,
  },

  /// Pool acquisition plus execution did not finish in time.
  #[error("storage call exceeded {0:?}")]
  Timeout(Duration),

  #[error("connection pool is closed")]
  PoolClosed,

  #[error("pool size must be at least 1")]
  EmptyPool,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for subtrack_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Timeout(_) => Self::Timeout,
      other => Self::internal(other),
    }
  }
}
