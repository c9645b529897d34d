//! Persistence Layer
//!
//! Local, durable storage for trade records and the sync reconciliation
//! ledger. Uses SQLite with async operations via sqlx.
//!
//! # Features
//! - Trade records surviving restarts
//! - Sync mapping ledger (local id ↔ remote id)
//! - In-memory fallback when the durable store cannot initialize
//! - Automatic schema migrations
//!
//! # Database Schema
//!
//! ## Trades Table
//! - id: Store-assigned integer, monotonic per store instance
//! - owner_id: Owner of the record
//! - symbol: Instrument symbol (e.g., "BTC-USD")
//! - direction: "long" or "short"
//! - entry_price / exit_price: Decimal
//! - quantity: Decimal
//! - stop_loss / take_profit: Optional risk levels
//! - opened_at / closed_at: Position timestamps
//! - created_at / updated_at: Caller-supplied record timestamps
//!
//! ## Sync Mappings Table
//! - remote_id: Backend-assigned id (primary key)
//! - local_id: Local trade id (unique)
//! - last_synced_at: Timestamp observed at the last successful sync

pub mod mapping_repository;
pub mod models;
pub mod storage;
pub mod trade_repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Mapping conflict: remote {remote_id} is bound to local {existing}, refusing rebind to local {attempted}")]
    MappingConflict {
        remote_id: String,
        existing: i64,
        attempted: i64,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Open the durable store and bootstrap its schema.
///
/// # Arguments
/// - `database_url`: Path to the SQLite file (e.g., "sqlite://data/tradesync.db")
///
/// # Errors
/// Returns an error if the connection or the schema bootstrap fails; a
/// partially-constructed pool is closed before returning.
pub async fn init_durable_store(database_url: &str) -> Result<DbPool, StorageError> {
    info!("Initializing database: {}", database_url);

    // Ensure data directory exists
    if let Some(db_path) = database_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .log_statements(tracing::log::LevelFilter::Debug);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if let Err(e) = run_migrations(&pool).await {
        pool.close().await;
        return Err(e);
    }

    info!("✓ Database initialized successfully");

    Ok(pool)
}

/// Open a fresh, uniquely-named in-memory store.
///
/// Shared-cache mode keeps every pool connection on the same database; the
/// pool is pinned to a single persistent connection so the contents live
/// as long as the pool does. The random name ensures a reset cannot
/// reattach to the contents of an earlier fallback.
pub async fn init_memory_store() -> Result<DbPool, StorageError> {
    let nonce: u64 = rand::random();
    let database_url = format!("sqlite:file:fallback_{:016x}?mode=memory&cache=shared", nonce);

    let options = SqliteConnectOptions::from_str(&database_url)?
        .log_statements(tracing::log::LevelFilter::Debug);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    if let Err(e) = run_migrations(&pool).await {
        pool.close().await;
        return Err(e);
    }

    info!("✓ In-memory store initialized ({})", database_url);

    Ok(pool)
}

/// Run database migrations (idempotent)
async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    info!("Running database migrations...");

    // Create trades table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            direction TEXT NOT NULL CHECK(direction IN ('long', 'short')),
            entry_price REAL NOT NULL,
            exit_price REAL,
            quantity REAL NOT NULL,
            stop_loss REAL,
            take_profit REAL,
            opened_at DATETIME NOT NULL,
            closed_at DATETIME,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::MigrationError(format!("Failed to create trades table: {}", e)))?;

    // Create sync mappings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_mappings (
            remote_id TEXT PRIMARY KEY,
            local_id INTEGER NOT NULL UNIQUE,
            last_synced_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        StorageError::MigrationError(format!("Failed to create sync_mappings table: {}", e))
    })?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_owner ON trades(owner_id)")
        .execute(pool)
        .await
        .map_err(|e| StorageError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_updated_at ON trades(updated_at)")
        .execute(pool)
        .await
        .map_err(|e| StorageError::MigrationError(format!("Failed to create index: {}", e)))?;

    info!("✓ Database migrations completed successfully");

    Ok(())
}
