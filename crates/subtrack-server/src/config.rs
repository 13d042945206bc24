//! Runtime configuration: an optional TOML file overlaid by `SUBTRACK_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use subtrack_store_sqlite::StoreConfig;
use thiserror::Error;

const ENV_PREFIX: &str = "SUBTRACK";

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub database_path:       PathBuf,
  pub jwt_secret:          String,
  pub token_ttl_secs:      u64,
  pub cors_origins:        Vec<String>,
  pub pool_size:           u32,
  pub query_timeout_ms:    u64,
  pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "0.0.0.0".to_string(),
      port:                8080,
      database_path:       PathBuf::from("subtrack.db"),
      jwt_secret:          String::new(),
      token_ttl_secs:      7 * 24 * 60 * 60,
      cors_origins:        Vec::new(),
      pool_size:           4,
      query_timeout_ms:    5_000,
      shutdown_grace_secs: 10,
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to load configuration: {0}")]
  Load(#[from] ::config::ConfigError),

  #[error("jwt_secret must be set")]
  MissingSecret,

  #[error("{0} must be greater than zero")]
  Zero(&'static str),
}

impl ServerConfig {
  /// Read `path` (if it exists) and the process environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::load_with_env(path, None)
  }

  /// Like [`ServerConfig::load`], with `env` standing in for the process
  /// environment when given.
  pub fn load_with_env(
    path: &Path,
    env: Option<::config::Map<String, String>>,
  ) -> Result<Self, ConfigError> {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from(path).required(false))
      .add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins")
          .source(env),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  /// Reject values the server cannot start with.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.jwt_secret.trim().is_empty() {
      return Err(ConfigError::MissingSecret);
    }
    for (name, value) in [
      ("pool_size", u64::from(self.pool_size)),
      ("token_ttl_secs", self.token_ttl_secs),
      ("query_timeout_ms", self.query_timeout_ms),
    ] {
      if value == 0 {
        return Err(ConfigError::Zero(name));
      }
    }
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn token_ttl(&self) -> Duration { Duration::from_secs(self.token_ttl_secs) }

  pub fn shutdown_grace(&self) -> Duration {
    Duration::from_secs(self.shutdown_grace_secs)
  }

  pub fn store_config(&self) -> StoreConfig {
    StoreConfig {
      pool_size: self.pool_size,
      query_timeout: Duration::from_millis(self.query_timeout_ms),
      ..StoreConfig::default()
    }
  }
}
