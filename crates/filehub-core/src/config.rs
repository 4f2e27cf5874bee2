//! Configuration module
//!
//! Environment-driven configuration for the core services. The host
//! application owns everything HTTP/auth related; the core only needs the
//! database and the encryption key.

use std::env;

use crate::error::AppError;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;

/// Core configuration loaded from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    /// Base64-encoded 32-byte AES-256-GCM key.
    pub encryption_key: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from the environment (a `.env` file is honored if
    /// present). Missing required variables are hard failures.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Internal("DATABASE_URL not set".to_string()))?;
        let encryption_key = env::var("ENCRYPTION_KEY")
            .map_err(|_| AppError::Encryption("ENCRYPTION_KEY not set".to_string()))?;

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        let db_timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DB_TIMEOUT_SECS);

        Ok(Config {
            database_url,
            encryption_key,
            db_max_connections,
            db_timeout_seconds,
        })
    }
}
