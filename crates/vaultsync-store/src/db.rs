//! SQLite connection setup
//!
//! One database file per installation holds the keyring records and the
//! per-account sync cursors. [`open`] prepares the pool and applies the
//! schema; the stores then share the pool through cheap clones.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::StoreError;

const SCHEMA: &str = include_str!("migrations/20260115_initial.sql");

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the database at `path`, creating file and parent directories as
/// needed, and applies the schema
///
/// WAL journaling keeps `status` reads unblocked while a sync pass writes.
pub async fn open(path: &Path) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::ConnectionFailed(format!("Cannot create {}: {e}", parent.display()))
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .map_err(|e| {
            StoreError::ConnectionFailed(format!("Cannot open {}: {e}", path.display()))
        })?;

    apply_schema(&pool).await?;
    tracing::info!(path = %path.display(), "Database ready");
    Ok(pool)
}

/// Opens a private in-memory database
///
/// Capped at a single connection: an in-memory SQLite database is visible
/// only to the connection that created it. Intended for tests.
pub async fn open_in_memory() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| {
            StoreError::ConnectionFailed(format!("Cannot open in-memory database: {e}"))
        })?;

    apply_schema(&pool).await?;
    Ok(pool)
}

// The schema script is idempotent, so it runs unconditionally on every open
async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
    Ok(())
}
