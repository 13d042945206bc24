//! JSON REST API for the subscription tracker.
//!
//! Exposes an axum [`Router`] over any store implementing both
//! [`AccountDirectory`] and [`SubscriptionLedger`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = subtrack_api::app(state, &config.cors_origins);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod subscriptions;

use std::{any::Any, sync::Arc};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
  response::Response,
  routing::{get, post, put},
};
use subtrack_auth::{CredentialVerifier, TokenService};
use subtrack_core::store::{AccountDirectory, SubscriptionLedger};
use subtrack_service::{AuthFlow, SubscriptionFlow};
use tower_http::{
  catch_panic::CatchPanicLayer,
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub auth:          Arc<AuthFlow<S>>,
  pub subscriptions: Arc<SubscriptionFlow<S>>,
  pub tokens:        Arc<TokenService>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      auth:          self.auth.clone(),
      subscriptions: self.subscriptions.clone(),
      tokens:        self.tokens.clone(),
    }
  }
}

impl<S> AppState<S>
where
  S: AccountDirectory + SubscriptionLedger,
{
  pub fn new(
    store: Arc<S>,
    verifier: CredentialVerifier,
    tokens: Arc<TokenService>,
  ) -> Self {
    Self {
      auth: Arc::new(AuthFlow::new(store.clone(), verifier, tokens.clone())),
      subscriptions: Arc::new(SubscriptionFlow::new(store)),
      tokens,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The bare API routes, relative to `/api`.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: AccountDirectory + SubscriptionLedger + 'static,
{
  Router::new()
    // Auth
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    // Subscriptions
    .route(
      "/subscriptions",
      get(subscriptions::list::<S>).post(subscriptions::create::<S>),
    )
    .route(
      "/subscriptions/{id}",
      put(subscriptions::update::<S>).delete(subscriptions::delete::<S>),
    )
    .with_state(state)
}

/// The complete application: routes under `/api` plus panic recovery, CORS
/// and request tracing.
pub fn app<S>(state: AppState<S>, cors_origins: &[String]) -> Router
where
  S: AccountDirectory + SubscriptionLedger + 'static,
{
  with_middleware(Router::new().nest("/api", api_router(state)), cors_origins)
}

fn with_middleware(router: Router, cors_origins: &[String]) -> Router {
  router
    .layer(CatchPanicLayer::custom(panic_response))
    .layer(cors_layer(cors_origins))
    .layer(TraceLayer::new_for_http())
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
  tracing::error!("handler panicked");
  ApiError::internal_response()
}

/// Mirror any origin when `origins` is empty (or contains `*`), otherwise
/// allow only the listed ones.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
  let configured: Vec<&str> = origins
    .iter()
    .map(|o| o.trim())
    .filter(|o| !o.is_empty())
    .collect();

  let allow_origin = if configured.is_empty() || configured.contains(&"*") {
    AllowOrigin::mirror_request()
  } else {
    AllowOrigin::list(configured.into_iter().filter_map(|origin| {
      HeaderValue::from_str(origin)
        .inspect_err(|_| tracing::warn!(origin, "ignoring invalid CORS origin"))
        .ok()
    }))
  };

  CorsLayer::new()
    .allow_origin(allow_origin)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
