//! Registration and login.

use std::sync::Arc;

use serde::Serialize;
use subtrack_auth::{CredentialVerifier, TokenService, credential::DECOY_HASH};
use subtrack_core::{
  Error, Result,
  store::AccountDirectory,
  user::{NewUser, User, normalize_email},
};

pub const MIN_PASSWORD_CHARS: usize = 8;

/// A freshly minted token together with the account it identifies.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
  pub token: String,
  pub user:  User,
}

pub struct AuthFlow<D> {
  directory: Arc<D>,
  verifier:  CredentialVerifier,
  tokens:    Arc<TokenService>,
}

impl<D: AccountDirectory> AuthFlow<D> {
  pub fn new(
    directory: Arc<D>,
    verifier: CredentialVerifier,
    tokens: Arc<TokenService>,
  ) -> Self {
    Self { directory, verifier, tokens }
  }

  /// Create an account and sign a token for it.
  pub async fn register(
    &self,
    name: &str,
    email: &str,
    password: &str,
  ) -> Result<AuthResult> {
    let name = name.trim();
    let email = normalize_email(email);
    if name.is_empty() {
      return Err(Error::invalid("name is required"));
    }
    if email.is_empty() {
      return Err(Error::invalid("email is required"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
      return Err(Error::invalid(format!(
        "password must be at least {MIN_PASSWORD_CHARS} characters"
      )));
    }

    let password_hash = self.hash_password(password).await?;
    let user = self
      .directory
      .create_user(NewUser { name: name.to_owned(), email, password_hash })
      .await?;
    tracing::info!(user_id = %user.id, "registered user");

    self.sign(user)
  }

  /// Check credentials and sign a token.
  ///
  /// An unknown email and a wrong password produce the same
  /// [`Error::Unauthorized`] after the same amount of hashing work.
  pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
      return Err(Error::invalid("email and password are required"));
    }

    let user = self.directory.find_by_email(&email).await?;
    let stored_hash = user
      .as_ref()
      .map_or(DECOY_HASH, |u| u.password_hash.as_str())
      .to_owned();
    let matches = self.verify_password(stored_hash, password).await?;

    match user {
      Some(user) if matches => self.sign(user),
      _ => {
        tracing::debug!("login rejected");
        Err(Error::Unauthorized)
      }
    }
  }

  fn sign(&self, user: User) -> Result<AuthResult> {
    let token = self.tokens.issue(user.owner_id(), &user.email)?;
    Ok(AuthResult { token, user })
  }

  async fn hash_password(&self, password: &str) -> Result<String> {
    let verifier = self.verifier.clone();
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || verifier.hash(&password))
      .await
      .map_err(Error::internal)??;
    Ok(hash)
  }

  async fn verify_password(&self, hash: String, password: &str) -> Result<bool> {
    let verifier = self.verifier.clone();
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || verifier.verify(&hash, &password))
      .await
      .map_err(Error::internal)
  }
}
