//! Remote Trade API Trait
//!
//! This module defines the `RemoteTradeApi` trait, the seam between the
//! sync engines and the authoritative backend. The trait decouples the
//! engines from the HTTP transport and enables an in-memory mock for
//! testing; the production implementation lives in
//! `infrastructure::backend_client`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::models::TradeRecord;

/// Common result type for remote API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur talking to the remote backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer credential was available
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("Remote API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Standard response envelope used by the backend (`{ "data": ... }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// A trade record as the backend returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTrade {
    pub id: String,
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

/// Creation payload for `POST /trades`.
///
/// Carries the open-side domain fields; close/exit fields of a record that
/// was closed before its first sync follow in an immediate update call.
/// Timestamps travel with the payload so last-writer-wins comparisons use
/// the edit time, not the transport time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRemoteTrade {
    pub symbol: String,
    pub direction: String,
    pub entry_price: f64,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    pub opened_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewRemoteTrade {
    pub fn from_record(record: &TradeRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            direction: record.direction.clone(),
            entry_price: record.entry_price,
            quantity: record.quantity,
            stop_loss: record.stop_loss,
            take_profit: record.take_profit,
            opened_at: record.opened_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Partial update payload for `PUT /trades/{id}`.
///
/// A fixed, enumerated field list: absent fields are not serialized and
/// the backend leaves them untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteTradeDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteTradeDelta {
    /// Full field set of the record, for a regular push update.
    pub fn from_record(record: &TradeRecord) -> Self {
        Self {
            symbol: Some(record.symbol.clone()),
            direction: Some(record.direction.clone()),
            entry_price: Some(record.entry_price),
            exit_price: record.exit_price,
            quantity: Some(record.quantity),
            stop_loss: record.stop_loss,
            take_profit: record.take_profit,
            opened_at: Some(record.opened_at),
            closed_at: record.closed_at,
            updated_at: Some(record.updated_at),
        }
    }

    /// Only the close/exit fields, for the follow-up call after creating a
    /// record that was already closed locally.
    pub fn close_fields(record: &TradeRecord, synced_at: DateTime<Utc>) -> Self {
        Self {
            exit_price: record.exit_price,
            closed_at: record.closed_at,
            updated_at: Some(synced_at),
            ..Self::default()
        }
    }
}

/// Client interface to the authoritative trade backend.
///
/// Implementations must attach the bearer credential to every request;
/// none of these calls may fabricate a remote id.
#[async_trait]
pub trait RemoteTradeApi: Send + Sync {
    /// Create a remote trade; returns the backend-assigned record.
    async fn create_trade(&self, trade: &NewRemoteTrade) -> ApiResult<RemoteTrade>;

    /// Apply a partial update to an existing remote trade.
    async fn update_trade(&self, remote_id: &str, delta: &RemoteTradeDelta) -> ApiResult<()>;

    /// List remote trades, optionally only those modified after the cursor.
    async fn list_trades(&self, updated_after: Option<DateTime<Utc>>) -> ApiResult<Vec<RemoteTrade>>;
}
