//! SQLite backend for the subscription tracker.
//!
//! Wraps a small pool of [`tokio_rusqlite`] connections so database access
//! runs off the async runtime, with every call bounded by a deadline.

mod encode;
mod pool;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteStore, StoreConfig};
