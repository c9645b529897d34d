//! Runtime configuration for the sync engine.
//!
//! All settings are environment-driven with safe defaults. Invalid values
//! are logged and replaced by the default rather than aborting startup.

use tracing::warn;
use url::Url;

/// Default location of the local trade store.
const DEFAULT_DATABASE_URL: &str = "sqlite://data/tradesync.db";

/// Default base URL of the remote trade backend.
const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

/// Sync engine configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Local store URL (e.g., "sqlite://data/tradesync.db")
    pub database_url: String,

    /// Base URL of the remote trade API
    pub api_base_url: String,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_seconds: u64,

    /// Owner whose trades this instance synchronizes
    pub owner_id: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: 30,
            owner_id: "local".to_string(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = SyncConfig::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database_url = url;
            }
        }

        if let Ok(base) = std::env::var("SYNC_API_BASE_URL") {
            match Url::parse(&base) {
                Ok(_) => config.api_base_url = base.trim_end_matches('/').to_string(),
                Err(e) => {
                    warn!(
                        "Invalid SYNC_API_BASE_URL '{}': {}, using default: {}",
                        base, e, config.api_base_url
                    );
                }
            }
        }

        if let Ok(timeout) = std::env::var("SYNC_REQUEST_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(value) if value > 0 => config.request_timeout_seconds = value,
                _ => {
                    warn!(
                        "Invalid SYNC_REQUEST_TIMEOUT_SECONDS '{}', using default: {}",
                        timeout, config.request_timeout_seconds
                    );
                }
            }
        }

        if let Ok(owner) = std::env::var("SYNC_OWNER_ID") {
            if !owner.trim().is_empty() {
                config.owner_id = owner;
            }
        }

        config
    }
}
