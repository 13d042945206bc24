//! subtrack server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `SUBTRACK_*`
//! environment variables, opens the SQLite store, applies migrations, and
//! serves the JSON API over HTTP until SIGINT or SIGTERM.
//!
//! # Migrations only
//!
//! ```text
//! cargo run -p subtrack-server -- --migrate-only
//! ```

mod config;

use std::{future::IntoFuture as _, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use subtrack_api::AppState;
use subtrack_auth::{CredentialVerifier, TokenService};
use subtrack_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Subscription tracker API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Open the database, apply pending migrations and exit.
  #[arg(long)]
  migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read {:?}", cli.config))?;
  cfg.validate().context("invalid configuration")?;

  let store = SqliteStore::open(&cfg.database_path, &cfg.store_config())
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))?;

  if cli.migrate_only {
    store.close().await.context("failed to close store")?;
    tracing::info!(path = ?cfg.database_path, "migrations applied");
    return Ok(());
  }

  let tokens = TokenService::new(cfg.jwt_secret.as_bytes(), cfg.token_ttl())
    .context("failed to build token service")?;
  let store = Arc::new(store);
  let state = AppState::new(
    store.clone(),
    CredentialVerifier::default(),
    Arc::new(tokens),
  );
  let app = subtrack_api::app(state, &cfg.cors_origins);

  let address = cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  serve(listener, app, cfg.shutdown_grace(), shutdown_signal()).await?;

  store.close().await.context("failed to close store")?;
  tracing::info!("shutdown complete");
  Ok(())
}

/// Serve until `shutdown` resolves, then give in-flight requests `grace` to
/// finish before returning.
async fn serve(
  listener: TcpListener,
  app: Router,
  grace: Duration,
  shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
  let (stopping_tx, mut stopping_rx) = watch::channel(false);

  let server = axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      shutdown.await;
      let _ = stopping_tx.send(true);
    })
    .into_future();
  tokio::pin!(server);

  tokio::select! {
    result = &mut server => return result.context("server error"),
    _ = stopping_rx.changed() => {}
  }

  match tokio::time::timeout(grace, &mut server).await {
    Ok(result) => result.context("server error"),
    Err(_) => {
      tracing::warn!(?grace, "grace period elapsed, dropping open connections");
      Ok(())
    }
  }
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!("failed to listen for SIGINT: {e}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::error!("failed to listen for SIGTERM: {e}");
        std::future::pending::<()>().await;
      }
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
    _ = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
}
