//! Trade Repository
//!
//! Data access for local trade records. Records are owned by the
//! application layer; the sync engines read them for push and only write
//! through `insert_from_remote` / `overwrite_from_remote` during pull.

use tracing::{debug, error};

use super::models::{NewLocalTrade, TradeRecord};
use super::{DbPool, StorageError};
use crate::domain::repositories::remote_api::RemoteTrade;

/// Trade repository
pub struct TradeRepository {
    pool: DbPool,
}

impl TradeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a local trade record with caller-supplied timestamps
    pub async fn create_local(&self, trade: NewLocalTrade) -> Result<TradeRecord, StorageError> {
        let record = sqlx::query_as::<_, TradeRecord>(
            r#"
            INSERT INTO trades (
                owner_id, symbol, direction, entry_price, exit_price, quantity,
                stop_loss, take_profit, opened_at, closed_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING *
            "#,
        )
        .bind(&trade.owner_id)
        .bind(&trade.symbol)
        .bind(&trade.direction)
        .bind(trade.entry_price)
        .bind(trade.exit_price)
        .bind(trade.quantity)
        .bind(trade.stop_loss)
        .bind(trade.take_profit)
        .bind(trade.opened_at)
        .bind(trade.closed_at)
        .bind(trade.created_at)
        .bind(trade.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create trade: {}", e);
            StorageError::QueryError(format!("Failed to create trade: {}", e))
        })?;

        debug!("Created trade {} for {}", record.id, record.symbol);
        Ok(record)
    }

    /// Get a trade by local id
    pub async fn get(&self, id: i64) -> Result<Option<TradeRecord>, StorageError> {
        let record = sqlx::query_as::<_, TradeRecord>("SELECT * FROM trades WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get trade {}: {}", id, e);
                StorageError::QueryError(format!("Failed to get trade: {}", e))
            })?;

        Ok(record)
    }

    /// All trades for an owner, unsynced records first.
    ///
    /// Records without a sync mapping have never reached the backend and
    /// are processed ahead of already-mapped ones.
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<TradeRecord>, StorageError> {
        let records = sqlx::query_as::<_, TradeRecord>(
            r#"
            SELECT t.* FROM trades t
            LEFT JOIN sync_mappings m ON m.local_id = t.id
            WHERE t.owner_id = ?1
            ORDER BY (m.remote_id IS NULL) DESC, t.id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list trades for {}: {}", owner_id, e);
            StorageError::QueryError(format!("Failed to list trades: {}", e))
        })?;

        Ok(records)
    }

    /// Insert a local record from a pulled remote trade; returns the
    /// store-assigned local id.
    pub async fn insert_from_remote(
        &self,
        owner_id: &str,
        remote: &RemoteTrade,
    ) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO trades (
                owner_id, symbol, direction, entry_price, exit_price, quantity,
                stop_loss, take_profit, opened_at, closed_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&remote.symbol)
        .bind(&remote.direction)
        .bind(remote.entry_price)
        .bind(remote.exit_price)
        .bind(remote.quantity)
        .bind(remote.stop_loss)
        .bind(remote.take_profit)
        .bind(remote.opened_at)
        .bind(remote.closed_at)
        .bind(remote.created_at)
        .bind(remote.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert trade from remote {}: {}", remote.id, e);
            StorageError::QueryError(format!("Failed to insert trade from remote: {}", e))
        })?;

        debug!("Inserted local trade {} from remote {}", row.0, remote.id);
        Ok(row.0)
    }

    /// Overwrite a local record's domain fields with the remote's
    /// (last-writer-wins merge). `created_at` and ownership are untouched.
    pub async fn overwrite_from_remote(
        &self,
        local_id: i64,
        remote: &RemoteTrade,
    ) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE trades
            SET symbol = ?1, direction = ?2, entry_price = ?3, exit_price = ?4,
                quantity = ?5, stop_loss = ?6, take_profit = ?7,
                opened_at = ?8, closed_at = ?9, updated_at = ?10
            WHERE id = ?11
            "#,
        )
        .bind(&remote.symbol)
        .bind(&remote.direction)
        .bind(remote.entry_price)
        .bind(remote.exit_price)
        .bind(remote.quantity)
        .bind(remote.stop_loss)
        .bind(remote.take_profit)
        .bind(remote.opened_at)
        .bind(remote.closed_at)
        .bind(remote.updated_at)
        .bind(local_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to overwrite trade {}: {}", local_id, e);
            StorageError::QueryError(format!("Failed to overwrite trade: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StorageError::QueryError(format!(
                "Trade not found: {}",
                local_id
            )));
        }

        debug!("Merged remote {} into local trade {}", remote.id, local_id);
        Ok(())
    }

    /// Trades for an owner
    pub async fn count_for_owner(&self, owner_id: &str) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades WHERE owner_id = ?1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(format!("Failed to count trades: {}", e)))?;

        Ok(row.0)
    }

    /// Trades for an owner that have never been synced
    pub async fn count_unsynced(&self, owner_id: &str) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM trades t
            LEFT JOIN sync_mappings m ON m.local_id = t.id
            WHERE t.owner_id = ?1 AND m.remote_id IS NULL
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            StorageError::QueryError(format!("Failed to count unsynced trades: {}", e))
        })?;

        Ok(row.0)
    }
}
