//! Push engine tests.

use super::{edit_local_trade, local_trade, ts, MockRemoteApi};
use crate::application::push::push_all;
use crate::persistence::init_memory_store;
use crate::persistence::mapping_repository::MappingRepository;
use crate::persistence::trade_repository::TradeRepository;

#[tokio::test]
async fn test_first_push_creates_remote_and_mapping() {
    let pool = init_memory_store().await.unwrap();
    let api = MockRemoteApi::new();
    let trades = TradeRepository::new(pool.clone());
    let mappings = MappingRepository::new(pool.clone());

    let record = trades.create_local(local_trade("u1", "BTC-USD", ts(10))).await.unwrap();

    let summary = push_all(pool, &api, "u1").await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 0);

    let mapping = mappings.get_by_local(record.id).await.unwrap().unwrap();
    assert_eq!(mapping.last_synced_at, ts(10));

    let remote = api.get(&mapping.remote_id).await.unwrap();
    assert_eq!(remote.symbol, "BTC-USD");
    assert_eq!(remote.updated_at, ts(10));
}

#[tokio::test]
async fn test_repeated_push_makes_no_network_calls() {
    let pool = init_memory_store().await.unwrap();
    let api = MockRemoteApi::new();
    let trades = TradeRepository::new(pool.clone());

    trades.create_local(local_trade("u1", "BTC-USD", ts(10))).await.unwrap();
    push_all(pool.clone(), &api, "u1").await.unwrap();
    let calls_after_first = api.calls().await;

    let summary = push_all(pool, &api, "u1").await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(api.calls().await, calls_after_first);
}

#[tokio::test]
async fn test_local_edit_pushes_update() {
    let pool = init_memory_store().await.unwrap();
    let api = MockRemoteApi::new();
    let trades = TradeRepository::new(pool.clone());
    let mappings = MappingRepository::new(pool.clone());

    let record = trades.create_local(local_trade("u1", "BTC-USD", ts(10))).await.unwrap();
    push_all(pool.clone(), &api, "u1").await.unwrap();

    edit_local_trade(&pool, record.id, 55000.0, ts(20)).await;

    let summary = push_all(pool, &api, "u1").await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);

    let mapping = mappings.get_by_local(record.id).await.unwrap().unwrap();
    assert_eq!(mapping.last_synced_at, ts(20));

    let remote = api.get(&mapping.remote_id).await.unwrap();
    assert_eq!(remote.entry_price, 55000.0);
    assert_eq!(remote.updated_at, ts(20));
}

#[tokio::test]
async fn test_record_closed_before_first_sync_gets_follow_up_update() {
    let pool = init_memory_store().await.unwrap();
    let api = MockRemoteApi::new();
    let trades = TradeRepository::new(pool.clone());
    let mappings = MappingRepository::new(pool.clone());

    let mut new_trade = local_trade("u1", "BTC-USD", ts(10));
    new_trade.exit_price = Some(51000.0);
    new_trade.closed_at = Some(ts(9));
    let record = trades.create_local(new_trade).await.unwrap();

    let summary = push_all(pool, &api, "u1").await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed, 0);

    let calls = api.calls().await;
    assert_eq!(calls.create, 1);
    assert_eq!(calls.update, 1);

    let mapping = mappings.get_by_local(record.id).await.unwrap().unwrap();
    // Advanced to the follow-up update's timestamp, past the record's own
    // updated_at, so the next pull will not merge our own close data back.
    assert!(mapping.last_synced_at > record.updated_at);

    let remote = api.get(&mapping.remote_id).await.unwrap();
    assert_eq!(remote.exit_price, Some(51000.0));
    assert_eq!(remote.closed_at, Some(ts(9)));
    assert!(remote.updated_at <= mapping.last_synced_at);
}

#[tokio::test]
async fn test_per_record_failure_does_not_abort_the_batch() {
    let pool = init_memory_store().await.unwrap();
    let api = MockRemoteApi::new();
    let trades = TradeRepository::new(pool.clone());

    trades.create_local(local_trade("u1", "BTC-USD", ts(10))).await.unwrap();
    trades.create_local(local_trade("u1", "ETH-USD", ts(11))).await.unwrap();
    api.fail_symbol("BTC-USD").await;

    let summary = push_all(pool, &api, "u1").await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed, 1);

    let remotes = api.trades().await;
    assert_eq!(remotes.len(), 1);
    assert_eq!(remotes[0].symbol, "ETH-USD");
}

#[tokio::test]
async fn test_retry_after_failure_creates_no_duplicates() {
    let pool = init_memory_store().await.unwrap();
    let api = MockRemoteApi::new();
    let trades = TradeRepository::new(pool.clone());

    trades.create_local(local_trade("u1", "BTC-USD", ts(10))).await.unwrap();
    trades.create_local(local_trade("u1", "ETH-USD", ts(11))).await.unwrap();

    api.fail_symbol("BTC-USD").await;
    push_all(pool.clone(), &api, "u1").await.unwrap();

    api.clear_failures().await;
    let summary = push_all(pool, &api, "u1").await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed, 0);

    // The already-synced record was not re-created.
    assert_eq!(api.trades().await.len(), 2);
}

#[tokio::test]
async fn test_push_processes_unsynced_records_first() {
    let pool = init_memory_store().await.unwrap();
    let api = MockRemoteApi::new();
    let trades = TradeRepository::new(pool.clone());

    let first = trades.create_local(local_trade("u1", "BTC-USD", ts(10))).await.unwrap();
    push_all(pool.clone(), &api, "u1").await.unwrap();

    // New, never-synced record plus a pending edit on the synced one.
    trades.create_local(local_trade("u1", "ETH-USD", ts(20))).await.unwrap();
    edit_local_trade(&pool, first.id, 60000.0, ts(21)).await;

    let summary = push_all(pool, &api, "u1").await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(api.trades().await.len(), 2);
}
