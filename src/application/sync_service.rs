//! Sync Orchestrator
//!
//! `SyncService` is the operation surface the UI layer calls. It owns the
//! storage lifecycle manager, the remote API client and the session
//! provider, and sequences the push and pull engines.
//!
//! Push always executes before pull. A local record edited while offline
//! must reach the backend before any remote data is merged back;
//! otherwise a pull on an already-mapped record could overwrite the
//! offline edit with stale remote state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::pull::{self, PullSummary};
use super::push::{self, PushSummary};
use crate::auth::SessionProvider;
use crate::domain::errors::SyncError;
use crate::domain::repositories::remote_api::RemoteTradeApi;
use crate::persistence::mapping_repository::MappingRepository;
use crate::persistence::storage::StorageManager;
use crate::persistence::trade_repository::TradeRepository;

/// Options for a bidirectional sync
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Only pull remote records modified after this cursor
    pub modified_since: Option<DateTime<Utc>>,
}

/// Combined result of a bidirectional sync
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncReport {
    pub push: PushSummary,
    pub pull: PullSummary,
}

/// Read-only diagnostic snapshot of the local sync state
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DebugState {
    /// Local trades for the owner
    pub local_trades: i64,
    /// Local trades that have never been synced
    pub unsynced_trades: i64,
    /// Total mapping records
    pub mappings: i64,
    /// Mappings whose local record is missing
    pub dangling_mappings: i64,
}

/// Sync orchestrator
pub struct SyncService {
    storage: StorageManager,
    api: Arc<dyn RemoteTradeApi>,
    session: Arc<dyn SessionProvider>,
}

impl SyncService {
    pub fn new(
        storage: StorageManager,
        api: Arc<dyn RemoteTradeApi>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            storage,
            api,
            session,
        }
    }

    /// Push all local changes for `owner_id` to the backend.
    pub async fn sync_to_remote(&self, owner_id: &str) -> Result<PushSummary, SyncError> {
        self.ensure_authenticated().await?;
        self.storage
            .with_store(|pool| push::push_all(pool, self.api.as_ref(), owner_id))
            .await
    }

    /// Pull every remote record for `owner_id` into the local store.
    pub async fn sync_from_remote(&self, owner_id: &str) -> Result<PullSummary, SyncError> {
        self.pull_internal(owner_id, None).await
    }

    /// Pull only remote records modified after `cursor`.
    pub async fn pull_after(
        &self,
        owner_id: &str,
        cursor: DateTime<Utc>,
    ) -> Result<PullSummary, SyncError> {
        self.pull_internal(owner_id, Some(cursor)).await
    }

    /// Full bidirectional sync: push, then pull.
    pub async fn sync_bidirectional(
        &self,
        owner_id: &str,
        options: SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let push = self.sync_to_remote(owner_id).await?;
        let pull = self.pull_internal(owner_id, options.modified_since).await?;
        Ok(SyncReport { push, pull })
    }

    /// Destructive recovery: tear down the local store. The next operation
    /// re-initializes from scratch.
    pub async fn reset(&self) {
        self.storage.reset().await;
    }

    /// Read-only diagnostic counters for `owner_id`.
    pub async fn debug_state(&self, owner_id: &str) -> Result<DebugState, SyncError> {
        self.storage
            .with_store(|pool| async move {
                let trades = TradeRepository::new(pool.clone());
                let mappings = MappingRepository::new(pool);
                Ok(DebugState {
                    local_trades: trades.count_for_owner(owner_id).await?,
                    unsynced_trades: trades.count_unsynced(owner_id).await?,
                    mappings: mappings.count().await?,
                    dangling_mappings: mappings.count_dangling().await?,
                })
            })
            .await
    }

    async fn pull_internal(
        &self,
        owner_id: &str,
        modified_since: Option<DateTime<Utc>>,
    ) -> Result<PullSummary, SyncError> {
        self.ensure_authenticated().await?;
        let remote_trades = self.api.list_trades(modified_since).await?;
        self.storage
            .with_store(|pool| pull::apply_remote(pool, owner_id, &remote_trades))
            .await
    }

    async fn ensure_authenticated(&self) -> Result<(), SyncError> {
        if self.session.access_token().await.is_none() {
            return Err(SyncError::NotAuthenticated);
        }
        Ok(())
    }
}
