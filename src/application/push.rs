//! Push Engine
//!
//! Walks local trade records and creates or updates their remote
//! counterparts, advancing the mapping ledger after each confirmed write.
//! Records are processed one at a time: the sequential loop respects
//! backend rate limits and keeps each mapping's read-then-write sequence
//! race-free. A failure on one record is counted and the loop moves on;
//! the engine never mutates local records.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::errors::SyncError;
use crate::domain::repositories::remote_api::{NewRemoteTrade, RemoteTradeApi, RemoteTradeDelta};
use crate::persistence::mapping_repository::MappingRepository;
use crate::persistence::models::TradeRecord;
use crate::persistence::trade_repository::TradeRepository;
use crate::persistence::DbPool;

/// Result counters for a push pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    /// Remote records created
    pub created: u32,
    /// Remote records updated
    pub updated: u32,
    /// Records that failed and were skipped over
    pub failed: u32,
}

enum PushOutcome {
    Created,
    Updated,
    Skipped,
}

/// Push every local trade belonging to `owner_id` to the backend.
///
/// Unsynced records (no mapping yet) are processed first. Mapped records
/// are only sent when their `updated_at` is newer than the mapping's
/// `last_synced_at`; everything else is skipped without a network call.
pub async fn push_all(
    pool: DbPool,
    api: &dyn RemoteTradeApi,
    owner_id: &str,
) -> Result<PushSummary, SyncError> {
    let trades = TradeRepository::new(pool.clone());
    let mappings = MappingRepository::new(pool);

    let records = trades.list_for_owner(owner_id).await?;
    debug!("Pushing {} local trades for {}", records.len(), owner_id);

    let mut summary = PushSummary::default();
    for record in &records {
        match push_one(&mappings, api, record).await {
            Ok(PushOutcome::Created) => summary.created += 1,
            Ok(PushOutcome::Updated) => summary.updated += 1,
            Ok(PushOutcome::Skipped) => {}
            Err(e) => {
                warn!("Failed to push trade {}: {}", record.id, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Push complete for {}: {} created, {} updated, {} failed",
        owner_id, summary.created, summary.updated, summary.failed
    );
    Ok(summary)
}

async fn push_one(
    mappings: &MappingRepository,
    api: &dyn RemoteTradeApi,
    record: &TradeRecord,
) -> Result<PushOutcome, SyncError> {
    match mappings.get_by_local(record.id).await? {
        None => {
            let remote = api.create_trade(&NewRemoteTrade::from_record(record)).await?;
            mappings.upsert(&remote.id, record.id, record.updated_at).await?;

            if record.is_closed() {
                // The record was closed before its first sync. Send the
                // close fields now and advance the mapping to this
                // update's timestamp, so the following pull does not see
                // our own close data as newer than the last sync.
                let synced_at = Utc::now();
                api.update_trade(&remote.id, &RemoteTradeDelta::close_fields(record, synced_at))
                    .await?;
                mappings.touch(record.id, synced_at).await?;
            }

            Ok(PushOutcome::Created)
        }
        Some(mapping) if record.updated_at > mapping.last_synced_at => {
            api.update_trade(&mapping.remote_id, &RemoteTradeDelta::from_record(record))
                .await?;
            mappings.touch(record.id, record.updated_at).await?;
            Ok(PushOutcome::Updated)
        }
        Some(_) => Ok(PushOutcome::Skipped),
    }
}
