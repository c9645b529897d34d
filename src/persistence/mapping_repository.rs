//! Sync Mapping Repository
//!
//! The reconciliation ledger: one row per synced (local, remote) pair.
//! Rows are created and updated exclusively by the sync engines and never
//! deleted by normal sync operation.

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::models::MappingRecord;
use super::{DbPool, StorageError};

/// Mapping repository
pub struct MappingRepository {
    pool: DbPool,
}

impl MappingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the mapping for a local trade id
    pub async fn get_by_local(&self, local_id: i64) -> Result<Option<MappingRecord>, StorageError> {
        let record = sqlx::query_as::<_, MappingRecord>(
            "SELECT * FROM sync_mappings WHERE local_id = ?1",
        )
        .bind(local_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get mapping for local {}: {}", local_id, e);
            StorageError::QueryError(format!("Failed to get mapping: {}", e))
        })?;

        Ok(record)
    }

    /// Get the mapping for a remote trade id
    pub async fn get_by_remote(
        &self,
        remote_id: &str,
    ) -> Result<Option<MappingRecord>, StorageError> {
        let record = sqlx::query_as::<_, MappingRecord>(
            "SELECT * FROM sync_mappings WHERE remote_id = ?1",
        )
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get mapping for remote {}: {}", remote_id, e);
            StorageError::QueryError(format!("Failed to get mapping: {}", e))
        })?;

        Ok(record)
    }

    /// Create or advance the mapping for a (remote, local) pair.
    ///
    /// Idempotent: repeating the call with the same arguments changes
    /// nothing, and `last_synced_at` only ever moves forward. Rebinding a
    /// remote id to a different local record is a logic error and fails
    /// loudly; the UNIQUE constraint on `local_id` backstops the reverse
    /// direction.
    pub async fn upsert(
        &self,
        remote_id: &str,
        local_id: i64,
        synced_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if let Some(existing) = self.get_by_remote(remote_id).await? {
            if existing.local_id != local_id {
                return Err(StorageError::MappingConflict {
                    remote_id: remote_id.to_string(),
                    existing: existing.local_id,
                    attempted: local_id,
                });
            }
            return self.advance(remote_id, synced_at).await;
        }

        sqlx::query(
            "INSERT INTO sync_mappings (remote_id, local_id, last_synced_at) VALUES (?1, ?2, ?3)",
        )
        .bind(remote_id)
        .bind(local_id)
        .bind(synced_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to insert mapping {} -> {}: {}",
                remote_id, local_id, e
            );
            StorageError::QueryError(format!("Failed to insert mapping: {}", e))
        })?;

        debug!("Created mapping {} -> local {}", remote_id, local_id);
        Ok(())
    }

    /// Advance `last_synced_at` for a local trade after a confirmed sync
    /// step. A timestamp that is not newer than the stored one is a no-op;
    /// a missing mapping is an error.
    pub async fn touch(
        &self,
        local_id: i64,
        synced_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if self.get_by_local(local_id).await?.is_none() {
            return Err(StorageError::QueryError(format!(
                "No mapping for local trade {}",
                local_id
            )));
        }

        sqlx::query(
            "UPDATE sync_mappings SET last_synced_at = ?2 WHERE local_id = ?1 AND last_synced_at < ?2",
        )
        .bind(local_id)
        .bind(synced_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to touch mapping for local {}: {}", local_id, e);
            StorageError::QueryError(format!("Failed to touch mapping: {}", e))
        })?;

        debug!("Touched mapping for local {}", local_id);
        Ok(())
    }

    /// Total number of mappings
    pub async fn count(&self) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_mappings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(format!("Failed to count mappings: {}", e)))?;

        Ok(row.0)
    }

    /// Mappings whose local record no longer exists
    pub async fn count_dangling(&self) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sync_mappings m LEFT JOIN trades t ON t.id = m.local_id WHERE t.id IS NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            StorageError::QueryError(format!("Failed to count dangling mappings: {}", e))
        })?;

        Ok(row.0)
    }

    async fn advance(&self, remote_id: &str, synced_at: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE sync_mappings SET last_synced_at = ?2 WHERE remote_id = ?1 AND last_synced_at < ?2",
        )
        .bind(remote_id)
        .bind(synced_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to advance mapping {}: {}", remote_id, e);
            StorageError::QueryError(format!("Failed to advance mapping: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_memory_store;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_lookup() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool);

        repo.upsert("r-1", 1, ts(10)).await.unwrap();

        let by_local = repo.get_by_local(1).await.unwrap().unwrap();
        assert_eq!(by_local.remote_id, "r-1");
        assert_eq!(by_local.last_synced_at, ts(10));

        let by_remote = repo.get_by_remote("r-1").await.unwrap().unwrap();
        assert_eq!(by_remote.local_id, 1);

        assert!(repo.get_by_local(2).await.unwrap().is_none());
        assert!(repo.get_by_remote("r-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool);

        repo.upsert("r-1", 1, ts(10)).await.unwrap();
        repo.upsert("r-1", 1, ts(10)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let record = repo.get_by_local(1).await.unwrap().unwrap();
        assert_eq!(record.last_synced_at, ts(10));
    }

    #[tokio::test]
    async fn test_upsert_never_regresses_last_synced_at() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool);

        repo.upsert("r-1", 1, ts(10)).await.unwrap();
        repo.upsert("r-1", 1, ts(5)).await.unwrap();

        let record = repo.get_by_local(1).await.unwrap().unwrap();
        assert_eq!(record.last_synced_at, ts(10));

        repo.upsert("r-1", 1, ts(20)).await.unwrap();
        let record = repo.get_by_local(1).await.unwrap().unwrap();
        assert_eq!(record.last_synced_at, ts(20));
    }

    #[tokio::test]
    async fn test_upsert_refuses_rebinding_remote_id() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool);

        repo.upsert("r-1", 1, ts(10)).await.unwrap();
        let err = repo.upsert("r-1", 2, ts(20)).await.unwrap_err();
        assert!(matches!(err, StorageError::MappingConflict { .. }));
    }

    #[tokio::test]
    async fn test_upsert_refuses_second_remote_for_same_local() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool);

        repo.upsert("r-1", 1, ts(10)).await.unwrap();
        // UNIQUE(local_id) must reject a second remote id for local 1.
        assert!(repo.upsert("r-2", 1, ts(20)).await.is_err());
    }

    #[tokio::test]
    async fn test_touch_advances_monotonically() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool);

        repo.upsert("r-1", 1, ts(10)).await.unwrap();

        repo.touch(1, ts(20)).await.unwrap();
        assert_eq!(
            repo.get_by_local(1).await.unwrap().unwrap().last_synced_at,
            ts(20)
        );

        // Older timestamp is a no-op, not a regression.
        repo.touch(1, ts(15)).await.unwrap();
        assert_eq!(
            repo.get_by_local(1).await.unwrap().unwrap().last_synced_at,
            ts(20)
        );
    }

    #[tokio::test]
    async fn test_touch_without_mapping_fails() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool);

        assert!(repo.touch(99, ts(10)).await.is_err());
    }

    #[tokio::test]
    async fn test_count_dangling() {
        let pool = init_memory_store().await.unwrap();
        let repo = MappingRepository::new(pool.clone());

        repo.upsert("r-1", 42, ts(10)).await.unwrap();
        assert_eq!(repo.count_dangling().await.unwrap(), 1);
    }
}
