//! Handlers for `/subscriptions` endpoints. All require a bearer token.
//!
//! | Method   | Path                  | Notes                          |
//! |----------|-----------------------|--------------------------------|
//! | `GET`    | `/subscriptions`      | Caller's rows by charge date   |
//! | `POST`   | `/subscriptions`      | 201                            |
//! | `PUT`    | `/subscriptions/{id}` | 404 if absent or not yours     |
//! | `DELETE` | `/subscriptions/{id}` | 200 with `{"id": ...}`         |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Serialize;
use subtrack_core::{
  store::{AccountDirectory, SubscriptionLedger},
  subscription::{Subscription, SubscriptionInput},
};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  extract::{Caller, Payload},
};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /subscriptions`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Caller(owner): Caller,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: AccountDirectory + SubscriptionLedger,
{
  Ok(Json(state.subscriptions.list(owner).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /subscriptions`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Caller(owner): Caller,
  Payload(input): Payload<SubscriptionInput>,
) -> Result<(StatusCode, Json<Subscription>), ApiError>
where
  S: AccountDirectory + SubscriptionLedger,
{
  let sub = state.subscriptions.create(owner, &input).await?;
  Ok((StatusCode::CREATED, Json(sub)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /subscriptions/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Caller(owner): Caller,
  Path(id): Path<String>,
  Payload(input): Payload<SubscriptionInput>,
) -> Result<Json<Subscription>, ApiError>
where
  S: AccountDirectory + SubscriptionLedger,
{
  Ok(Json(state.subscriptions.update(owner, &id, &input).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Deleted {
  pub id: Uuid,
}

/// `DELETE /subscriptions/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Caller(owner): Caller,
  Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError>
where
  S: AccountDirectory + SubscriptionLedger,
{
  let id = state.subscriptions.delete(owner, &id).await?;
  Ok(Json(Deleted { id }))
}
