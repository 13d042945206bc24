//! Handlers for `/auth` endpoints.
//!
//! | Method | Path             | Notes                               |
//! |--------|------------------|-------------------------------------|
//! | `POST` | `/auth/register` | 201 with `{token, user}`            |
//! | `POST` | `/auth/login`    | 200 with `{token, user}`; 401 on any credential failure |

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use subtrack_core::store::{AccountDirectory, SubscriptionLedger};
use subtrack_service::AuthResult;

use crate::{AppState, error::ApiError, extract::Payload};

/// Body of both auth endpoints. `name` is only read by registration.
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Credentials {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Payload(body): Payload<Credentials>,
) -> Result<(StatusCode, Json<AuthResult>), ApiError>
where
  S: AccountDirectory + SubscriptionLedger,
{
  let result = state
    .auth
    .register(&body.name, &body.email, &body.password)
    .await?;
  Ok((StatusCode::CREATED, Json(result)))
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Payload(body): Payload<Credentials>,
) -> Result<Json<AuthResult>, ApiError>
where
  S: AccountDirectory + SubscriptionLedger,
{
  Ok(Json(state.auth.login(&body.email, &body.password).await?))
}
