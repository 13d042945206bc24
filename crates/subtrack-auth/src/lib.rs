//! Password hashing and identity tokens.
//!
//! Both components are stateless after construction and safe to share across
//! request tasks behind an `Arc`.

pub mod credential;
pub mod error;
pub mod token;

pub use credential::CredentialVerifier;
pub use error::{CredentialError, TokenError};
pub use token::{Claims, TokenService};
