//! Core types and trait definitions for the subscription tracker.
//!
//! This crate is free of HTTP, crypto and database dependencies. It owns the
//! business error taxonomy, the domain records, input validation, and the
//! storage traits every backend implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod error;
pub mod memory;
pub mod store;
pub mod subscription;
pub mod user;

pub use error::{Error, Result};
pub use user::OwnerId;
