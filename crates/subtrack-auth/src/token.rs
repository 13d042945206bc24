//! Signed, time-bounded identity tokens (HS256 JWT).

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use subtrack_core::OwnerId;
use uuid::Uuid;

use crate::TokenError;

/// The one algorithm this service signs with and accepts.
const ALGORITHM: Algorithm = Algorithm::HS256;

pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Claims carried by every identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// Owner identifier (user UUID).
  pub sub:   String,
  pub email: String,
  /// Issued at (Unix seconds).
  pub iat:   i64,
  /// Expiry (Unix seconds); always `iat + ttl`.
  pub exp:   i64,
}

/// Issues and validates identity tokens with a fixed symmetric secret.
#[derive(Clone)]
pub struct TokenService {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        TimeDelta,
}

impl TokenService {
  /// Build the service. An empty secret or a zero TTL is a configuration
  /// error and should abort startup.
  pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
    if secret.is_empty() {
      return Err(TokenError::Configuration("signing secret is empty".into()));
    }
    let ttl = TimeDelta::from_std(ttl)
      .ok()
      .filter(|ttl| *ttl > TimeDelta::zero())
      .ok_or_else(|| {
        TokenError::Configuration("token ttl must be positive".into())
      })?;

    let mut validation = Validation::new(ALGORITHM);
    validation.algorithms = vec![ALGORITHM];
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    Ok(Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      ttl,
    })
  }

  pub fn ttl(&self) -> TimeDelta { self.ttl }

  /// Issue a token for `owner`, valid from now for the configured TTL.
  pub fn issue(&self, owner: OwnerId, email: &str) -> Result<String, TokenError> {
    self.issue_at(owner, email, Utc::now())
  }

  /// Issue a token as if the current time were `now`.
  pub fn issue_at(
    &self,
    owner: OwnerId,
    email: &str,
    now: DateTime<Utc>,
  ) -> Result<String, TokenError> {
    let claims = Claims {
      sub:   owner.to_string(),
      email: email.to_owned(),
      iat:   now.timestamp(),
      exp:   (now + self.ttl).timestamp(),
    };
    encode(&Header::new(ALGORITHM), &claims, &self.encoding)
      .map_err(TokenError::Signing)
  }

  /// Validate `token` and return the owner it was issued to.
  ///
  /// Every failure collapses into [`TokenError::Invalid`]; the concrete
  /// reason is only logged.
  pub fn validate(&self, token: &str) -> Result<OwnerId, TokenError> {
    let data = decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| {
        tracing::debug!(reason = ?e.kind(), "token rejected");
        TokenError::Invalid
      })?;

    let sub = data.claims.sub.trim();
    let id = Uuid::parse_str(sub).map_err(|_| {
      tracing::debug!("token rejected: sub is not a user id");
      TokenError::Invalid
    })?;

    let owner = OwnerId::new(id);
    if owner.is_empty() {
      tracing::debug!("token rejected: empty sub");
      return Err(TokenError::Invalid);
    }
    Ok(owner)
  }
}
