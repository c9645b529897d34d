use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradesync::application::sync_service::{SyncOptions, SyncService};
use tradesync::auth::{EnvSessionProvider, SessionProvider};
use tradesync::config::SyncConfig;
use tradesync::infrastructure::backend_client::{BackendClient, BackendConfig};
use tradesync::persistence::storage::StorageManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradesync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SyncConfig::from_env();
    info!(
        "Tradesync starting (store: {}, backend: {})",
        config.database_url, config.api_base_url
    );

    let session: Arc<dyn SessionProvider> = Arc::new(EnvSessionProvider::default());
    let backend = BackendClient::new(BackendConfig::from_sync_config(&config), session.clone())?;
    let service = SyncService::new(
        StorageManager::new(config.database_url.clone()),
        Arc::new(backend),
        session,
    );

    let report = service
        .sync_bidirectional(&config.owner_id, SyncOptions::default())
        .await?;

    info!(
        "✓ Sync complete: push {} created / {} updated / {} failed, pull {} pulled / {} inserted / {} merged / {} skipped",
        report.push.created,
        report.push.updated,
        report.push.failed,
        report.pull.pulled,
        report.pull.inserted,
        report.pull.merged,
        report.pull.skipped
    );

    let state = service.debug_state(&config.owner_id).await?;
    info!(
        "Local state: {} trades ({} unsynced), {} mappings ({} dangling)",
        state.local_trades, state.unsynced_trades, state.mappings, state.dangling_mappings
    );

    // Machine-readable report on stdout for scripting callers.
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
