//! Argon2id password hashing.

use argon2::{
  Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
  Version, password_hash::SaltString,
};
use rand_core::{OsRng, RngCore};

use crate::CredentialError;

/// Memory cost in KiB (OWASP argon2id baseline).
pub const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

/// A well-formed hash that matches no password. Verified against when a login
/// names an unknown account so both failure paths do the same work.
pub const DECOY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c3VidHJhY2stZGVjb3ktcw$T/225fYndLMCH6FB1FYf+LcJyEzEBpiIs4w7hFywhlw";

const SALT_LEN: usize = 16;

/// Hashes and verifies passwords. Cheap to clone.
#[derive(Clone)]
pub struct CredentialVerifier {
  argon2: Argon2<'static>,
}

impl Default for CredentialVerifier {
  fn default() -> Self {
    Self::with_cost(DEFAULT_MEMORY_KIB, DEFAULT_ITERATIONS, DEFAULT_PARALLELISM)
      .unwrap_or_else(|_| Self { argon2: Argon2::default() })
  }
}

impl CredentialVerifier {
  /// Build a verifier with an explicit argon2id cost.
  pub fn with_cost(
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
  ) -> Result<Self, CredentialError> {
    let params = Params::new(memory_kib, iterations, parallelism, None)
      .map_err(|e| CredentialError::Cost(e.to_string()))?;
    Ok(Self {
      argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
    })
  }

  /// Hash `password` with a fresh random salt into a PHC string.
  pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
      .try_fill_bytes(&mut salt)
      .map_err(|e| CredentialError::Entropy(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt)
      .map_err(|e| CredentialError::Hash(e.to_string()))?;

    let hash = self
      .argon2
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(hash.to_string())
  }

  /// Check `password` against a stored PHC string.
  ///
  /// The digest comparison is constant-time. A malformed hash is reported as
  /// a plain mismatch.
  pub fn verify(&self, hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
      tracing::warn!("stored password hash is not a valid PHC string");
      return false;
    };
    self
      .argon2
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn verifier() -> CredentialVerifier {
    CredentialVerifier::with_cost(1024, 1, 1).unwrap()
  }

  #[test]
  fn hash_then_verify() {
    let v = verifier();
    let hash = v.hash("longenough1").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(v.verify(&hash, "longenough1"));
    assert!(!v.verify(&hash, "longenough2"));
  }

  #[test]
  fn same_password_gets_distinct_salts() {
    let v = verifier();
    assert_ne!(v.hash("password").unwrap(), v.hash("password").unwrap());
  }

  #[test]
  fn malformed_hash_is_a_mismatch() {
    let v = verifier();
    assert!(!v.verify("not-a-phc-string", "password"));
    assert!(!v.verify("", ""));
  }

  #[test]
  fn decoy_hash_parses_and_matches_nothing() {
    assert!(PasswordHash::new(DECOY_HASH).is_ok());
    assert!(!verifier().verify(DECOY_HASH, "longenough1"));
  }

  #[test]
  fn zero_iterations_is_rejected() {
    assert!(matches!(
      CredentialVerifier::with_cost(1024, 0, 1),
      Err(CredentialError::Cost(_))
    ));
  }
}
