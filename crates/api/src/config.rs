//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Optional bearer token required on /api routes.
    pub api_token: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `REVERIE_API_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `REVERIE_DATABASE_URL` | SQLite database URL | `sqlite:reverie.db?mode=rwc` |
    /// | `REVERIE_API_TOKEN` | Bearer token for /api routes | (none; auth disabled) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("REVERIE_API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("REVERIE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:reverie.db?mode=rwc".to_string());

        let api_token = env::var("REVERIE_API_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self {
            addr,
            database_url,
            api_token,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid REVERIE_API_ADDR format")]
    InvalidAddr,
}
