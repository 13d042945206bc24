//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by a handler or extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing bearer token")]
  MissingToken,

  #[error("invalid bearer token")]
  InvalidToken,

  #[error("invalid payload: {0}")]
  Payload(#[from] JsonRejection),

  #[error(transparent)]
  Core(#[from] subtrack_core::Error),
}

impl ApiError {
  /// The generic 500 used for unexpected failures and caught panics.
  pub fn internal_response() -> Response {
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
  }
}

fn error_body(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "error": message }))).into_response()
}

fn unauthorized(message: &str) -> Response {
  let mut res = error_body(StatusCode::UNAUTHORIZED, message);
  res
    .headers_mut()
    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
  res
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use subtrack_core::Error as Core;

    match self {
      ApiError::MissingToken => unauthorized("missing token"),
      ApiError::InvalidToken => unauthorized("invalid token"),
      ApiError::Payload(rejection) => {
        tracing::debug!(%rejection, "rejected request body");
        error_body(StatusCode::BAD_REQUEST, "invalid payload")
      }
      ApiError::Core(Core::InvalidInput(message)) => {
        error_body(StatusCode::BAD_REQUEST, &message)
      }
      ApiError::Core(Core::Unauthorized) => unauthorized("invalid credentials"),
      ApiError::Core(Core::NotFound) => {
        error_body(StatusCode::NOT_FOUND, "subscription not found")
      }
      ApiError::Core(Core::DuplicateEmail) => {
        error_body(StatusCode::CONFLICT, "email already in use")
      }
      ApiError::Core(Core::Timeout) => error_body(
        StatusCode::SERVICE_UNAVAILABLE,
        "service temporarily unavailable",
      ),
      ApiError::Core(Core::Internal(source)) => {
        tracing::error!(error = %source, "request failed");
        Self::internal_response()
      }
    }
  }
}
