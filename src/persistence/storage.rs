//! Storage Lifecycle Manager
//!
//! Owns at most one live database pool. First `get_store` initializes the
//! durable store; if that fails the session continues on a uniquely-named
//! in-memory fallback while a detached task cleans up the corrupted files.
//! `with_store` wraps store operations with the engine's single
//! reset-and-retry recovery step.
//!
//! The manager is an explicit, dependency-injected instance owned by the
//! composing application, not a process global. Concurrent `get_store`
//! callers serialize on the internal lock, so only one initialization is
//! ever in flight.

use std::future::Future;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::{init_durable_store, init_memory_store, DbPool, StorageError};
use crate::domain::errors::SyncError;

/// Storage lifecycle manager
pub struct StorageManager {
    database_url: String,
    state: Mutex<Option<DbPool>>,
}

impl StorageManager {
    /// Create a manager for the given store URL. No connection is opened
    /// until the first `get_store` call.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            state: Mutex::new(None),
        }
    }

    /// Get a ready store handle, initializing it on first call.
    ///
    /// Callers arriving during initialization await the same in-flight
    /// attempt; no duplicate initialization is ever started.
    ///
    /// # Errors
    /// Returns `StorageError::Unavailable` only when both the durable
    /// store and the in-memory fallback fail. This is fatal and not
    /// retried automatically.
    pub async fn get_store(&self) -> Result<DbPool, StorageError> {
        let mut state = self.state.lock().await;
        if let Some(pool) = state.as_ref() {
            return Ok(pool.clone());
        }

        let pool = self.initialize().await?;
        *state = Some(pool.clone());
        Ok(pool)
    }

    /// Close the current handle and clear state so the next `get_store`
    /// re-initializes from scratch.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        if let Some(pool) = state.take() {
            pool.close().await;
            info!("Storage handle closed and cleared");
        }
    }

    /// Run a store operation with the engine's bounded recovery step.
    ///
    /// If `op` fails, the store is reset and `op` runs exactly once more
    /// against a fresh handle. A second failure surfaces as
    /// `SyncError::DatabaseUnavailable`; the first error is only logged.
    pub async fn with_store<T, F, Fut>(&self, op: F) -> Result<T, SyncError>
    where
        F: Fn(DbPool) -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let pool = self.get_store().await?;
        match op(pool).await {
            Ok(value) => Ok(value),
            Err(first) => {
                warn!(
                    "Store operation failed, resetting storage and retrying once: {}",
                    first
                );
                self.reset().await;
                let pool = self.get_store().await?;
                op(pool).await.map_err(|retry| {
                    error!("Store operation failed again after reset: {}", retry);
                    SyncError::DatabaseUnavailable(retry.to_string())
                })
            }
        }
    }

    async fn initialize(&self) -> Result<DbPool, StorageError> {
        match init_durable_store(&self.database_url).await {
            Ok(pool) => Ok(pool),
            Err(durable_err) => {
                warn!(
                    "Durable store initialization failed ({}), falling back to in-memory store",
                    durable_err
                );
                schedule_corrupt_store_cleanup(&self.database_url);

                match init_memory_store().await {
                    Ok(pool) => {
                        info!("✓ Running on in-memory fallback; data will not survive restart");
                        Ok(pool)
                    }
                    Err(fallback_err) => {
                        error!(
                            "In-memory fallback initialization failed: {}",
                            fallback_err
                        );
                        Err(StorageError::Unavailable(format!(
                            "durable: {}; fallback: {}",
                            durable_err, fallback_err
                        )))
                    }
                }
            }
        }
    }
}

/// Best-effort removal of the corrupted durable store files.
///
/// Runs detached; the outcome is never awaited and failures are logged and
/// swallowed so they cannot surface through `get_store`.
fn schedule_corrupt_store_cleanup(database_url: &str) {
    let Some(db_path) = database_url.strip_prefix("sqlite://").map(PathBuf::from) else {
        return;
    };

    tokio::spawn(async move {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = db_path.clone().into_os_string();
            path.push(suffix);
            let path = PathBuf::from(path);
            match std::fs::remove_file(&path) {
                Ok(()) => info!("Removed corrupted store file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
    });
}
