//! Pull Engine
//!
//! Applies a batch of remote trade records to the local store: unknown
//! remote records are inserted, known ones are merged when the remote is
//! newer than the last sync (last-writer-wins), and stale ones are
//! skipped. Pull never deletes local records, even when a remote record
//! has vanished.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::errors::SyncError;
use crate::domain::repositories::remote_api::RemoteTrade;
use crate::persistence::mapping_repository::MappingRepository;
use crate::persistence::trade_repository::TradeRepository;
use crate::persistence::DbPool;

/// Result counters for a pull pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    /// Remote records examined
    pub pulled: u32,
    /// New local records inserted
    pub inserted: u32,
    /// Local records overwritten by a newer remote
    pub merged: u32,
    /// Records with nothing to apply (or that failed mid-merge)
    pub skipped: u32,
}

enum MergeOutcome {
    Inserted,
    Merged,
    Skipped,
}

/// Apply `remote_trades` to the local store for `owner_id`.
pub async fn apply_remote(
    pool: DbPool,
    owner_id: &str,
    remote_trades: &[RemoteTrade],
) -> Result<PullSummary, SyncError> {
    let trades = TradeRepository::new(pool.clone());
    let mappings = MappingRepository::new(pool);

    debug!(
        "Applying {} remote trades for {}",
        remote_trades.len(),
        owner_id
    );

    let mut summary = PullSummary::default();
    for remote in remote_trades {
        summary.pulled += 1;
        match merge_one(&trades, &mappings, owner_id, remote).await {
            Ok(MergeOutcome::Inserted) => summary.inserted += 1,
            Ok(MergeOutcome::Merged) => summary.merged += 1,
            Ok(MergeOutcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                warn!("Failed to apply remote trade {}: {}", remote.id, e);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "Pull complete for {}: {} pulled, {} inserted, {} merged, {} skipped",
        owner_id, summary.pulled, summary.inserted, summary.merged, summary.skipped
    );
    Ok(summary)
}

async fn merge_one(
    trades: &TradeRepository,
    mappings: &MappingRepository,
    owner_id: &str,
    remote: &RemoteTrade,
) -> Result<MergeOutcome, SyncError> {
    match mappings.get_by_remote(&remote.id).await? {
        None => {
            let local_id = trades.insert_from_remote(owner_id, remote).await?;
            mappings.upsert(&remote.id, local_id, remote.updated_at).await?;
            Ok(MergeOutcome::Inserted)
        }
        Some(mapping) if remote.updated_at > mapping.last_synced_at => {
            trades.overwrite_from_remote(mapping.local_id, remote).await?;
            mappings.touch(mapping.local_id, remote.updated_at).await?;
            Ok(MergeOutcome::Merged)
        }
        Some(_) => Ok(MergeOutcome::Skipped),
    }
}
