//! Sync engine error taxonomy.
//!
//! Per-record failures never surface as errors: the engines catch them,
//! count them and keep going. What does surface here is fatal for the
//! whole invocation: missing authentication, storage faults that survived
//! the single reset-and-retry, and remote API failures outside a record
//! loop.

use thiserror::Error;

use crate::domain::repositories::remote_api::ApiError;
use crate::persistence::StorageError;

/// Errors surfaced by the sync engine's public operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// No active session; the caller must re-authenticate before syncing.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Local store fault (init or query).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The store failed again after a full reset; user action (refresh)
    /// is required.
    #[error("Database unavailable, refresh required: {0}")]
    DatabaseUnavailable(String),

    /// Remote API failure outside a per-record loop.
    #[error("Remote API error: {0}")]
    Api(#[from] ApiError),
}
