// Test modules for the sync engines and orchestrator.

mod push_tests;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::repositories::remote_api::RemoteTrade;
use crate::persistence::models::NewLocalTrade;
use crate::persistence::DbPool;

pub use mock_remote_api::MockRemoteApi;

pub fn ts(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
}

pub fn local_trade(owner: &str, symbol: &str, at: DateTime<Utc>) -> NewLocalTrade {
    NewLocalTrade {
        owner_id: owner.to_string(),
        symbol: symbol.to_string(),
        direction: "long".to_string(),
        entry_price: 50000.0,
        exit_price: None,
        quantity: 0.1,
        stop_loss: Some(49000.0),
        take_profit: Some(52000.0),
        opened_at: at,
        closed_at: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn remote_trade(id: &str, symbol: &str, at: DateTime<Utc>) -> RemoteTrade {
    RemoteTrade {
        id: id.to_string(),
        symbol: symbol.to_string(),
        direction: "long".to_string(),
        entry_price: 42000.0,
        exit_price: None,
        quantity: 0.5,
        stop_loss: None,
        take_profit: None,
        opened_at: at,
        closed_at: None,
        created_at: at,
        updated_at: at,
    }
}

/// Simulate a UI edit: bump a field and the caller-supplied `updated_at`.
/// Local records are written by the application layer outside the engine,
/// so tests write them directly against the store.
pub async fn edit_local_trade(pool: &DbPool, local_id: i64, entry_price: f64, at: DateTime<Utc>) {
    sqlx::query("UPDATE trades SET entry_price = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(entry_price)
        .bind(at)
        .bind(local_id)
        .execute(pool)
        .await
        .unwrap();
}
