//! Request extractors: the authenticated caller and JSON bodies.

use axum::{
  extract::{FromRequest, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use subtrack_auth::TokenService;
use subtrack_core::OwnerId;

use crate::{AppState, error::ApiError};

// ─── Caller ──────────────────────────────────────────────────────────────────

/// The owner identified by the request's bearer token.
///
/// Present in a handler means the token was valid; every ledger call made
/// by that handler is scoped to this owner.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub OwnerId);

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .ok_or(ApiError::MissingToken)?
    .to_str()
    .map_err(|_| ApiError::InvalidToken)?
    .trim();

  // The scheme is case-insensitive and must be followed by whitespace.
  let (scheme, token) = value
    .split_once(|c: char| c.is_ascii_whitespace())
    .unwrap_or((value, ""));
  if !scheme.eq_ignore_ascii_case("bearer") {
    return Err(ApiError::InvalidToken);
  }
  let token = token.trim();
  if token.is_empty() {
    return Err(ApiError::MissingToken);
  }
  Ok(token)
}

/// Validate the bearer token in `headers` and return its owner.
pub fn authenticate(
  headers: &HeaderMap,
  tokens: &TokenService,
) -> Result<OwnerId, ApiError> {
  let token = bearer_token(headers)?;
  tokens.validate(token).map_err(|_| ApiError::InvalidToken)
}

impl<S> FromRequestParts<AppState<S>> for Caller
where
  S: Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, &state.tokens).map(Caller)
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// A JSON body whose rejection is reported as [`ApiError::Payload`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use axum::{body::Body, http::Request};
  use uuid::Uuid;

  use super::*;

  const SECRET: &[u8] = b"extractor-test-secret";

  fn tokens() -> TokenService {
    TokenService::new(SECRET, Duration::from_secs(3600)).unwrap()
  }

  fn headers(authorization: Option<&str>) -> HeaderMap {
    let mut builder = Request::builder();
    if let Some(value) = authorization {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(Body::empty()).unwrap().into_parts();
    parts.headers
  }

  #[test]
  fn valid_bearer_token() {
    let tokens = tokens();
    let owner = OwnerId::new(Uuid::new_v4());
    let token = tokens.issue(owner, "ana@x.com").unwrap();

    let got = authenticate(&headers(Some(&format!("Bearer {token}"))), &tokens);
    assert_eq!(got.unwrap(), owner);
  }

  #[test]
  fn missing_header_or_empty_token() {
    let tokens = tokens();
    for h in [headers(None), headers(Some("Bearer")), headers(Some("Bearer   "))] {
      assert!(matches!(authenticate(&h, &tokens), Err(ApiError::MissingToken)));
    }
  }

  #[test]
  fn wrong_scheme_or_garbage() {
    let tokens = tokens();
    for value in ["Basic dXNlcjpwYXNz", "Bearer not.a.jwt", "token-without-scheme"] {
      assert!(
        matches!(authenticate(&headers(Some(value)), &tokens), Err(ApiError::InvalidToken)),
        "{value}"
      );
    }
  }

  #[test]
  fn scheme_needs_a_separator_but_not_a_case() {
    let tokens = tokens();
    let owner = OwnerId::new(Uuid::new_v4());
    let token = tokens.issue(owner, "ana@x.com").unwrap();

    let glued = authenticate(&headers(Some(&format!("Bearer{token}"))), &tokens);
    assert!(matches!(glued, Err(ApiError::InvalidToken)));

    for scheme in ["bearer", "BEARER"] {
      let got = authenticate(&headers(Some(&format!("{scheme} {token}"))), &tokens);
      assert_eq!(got.unwrap(), owner, "{scheme}");
    }
  }

  #[test]
  fn token_from_another_secret_is_invalid() {
    let other = TokenService::new(b"other-secret", Duration::from_secs(3600)).unwrap();
    let token = other.issue(OwnerId::new(Uuid::new_v4()), "ana@x.com").unwrap();
    let got = authenticate(&headers(Some(&format!("Bearer {token}"))), &tokens());
    assert!(matches!(got, Err(ApiError::InvalidToken)));
  }
}
