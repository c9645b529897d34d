//! Database Models
//!
//! Persistent data structures for trade records and sync mappings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Trade record in the local store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeRecord {
    /// Store-assigned local id, never reused within a store instance
    pub id: i64,
    pub owner_id: String,
    pub symbol: String,
    pub direction: String, // "long" or "short"
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TradeRecord {
    /// True when the record carries close/exit data.
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some() || self.exit_price.is_some()
    }
}

/// Sync mapping record: one local record ↔ one remote record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MappingRecord {
    pub remote_id: String,
    pub local_id: i64,
    /// `updated_at` value (local or remote) observed at the most recent
    /// successful sync of this pair; only ever advances.
    pub last_synced_at: DateTime<Utc>,
}

/// Create trade input
///
/// Timestamps are caller-supplied; the store never stamps records itself.
#[derive(Debug, Clone)]
pub struct NewLocalTrade {
    pub owner_id: String,
    pub symbol: String,
    pub direction: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
