//! SQLite implementation of the `RecordStore` port
//!
//! Handles all domain type serialization/deserialization and SQL query
//! construction for keyring record metadata.
//!
//! ## Type Mapping
//!
//! | Domain Type    | SQL Type | Strategy                                   |
//! |----------------|----------|--------------------------------------------|
//! | RecordId       | TEXT     | UUID string via `.to_string()` / `FromStr` |
//! | RemoteFileId   | TEXT     | String via `.as_str()` / `RemoteFileId::new()` |
//! | DateTime<Utc>  | TEXT     | ISO 8601 via `to_rfc3339()` / `DateTime::parse_from_rfc3339()` |
//! | deleted flag   | INTEGER  | 0 / 1                                      |
//!
//! Every mutation is announced on a broadcast channel so the host UI can
//! refresh its record list without polling.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::broadcast;

use vaultsync_core::domain::newtypes::{RecordId, RemoteFileId};
use vaultsync_core::domain::record::KeyringRecord;
use vaultsync_core::ports::RecordStore;

use crate::StoreError;

/// Capacity of the change broadcast channel; lagging receivers drop the
/// oldest notifications, which is fine because a notification only means
/// "re-query the store".
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Notification that records for an account were mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// Account whose records changed
    pub account: String,
}

/// SQLite-based implementation of the record store port
///
/// Provides persistent storage for keyring records using SQLite. All
/// operations are performed through a connection pool for concurrency.
pub struct SqliteRecordStore {
    pool: SqlitePool,
    changes: broadcast::Sender<RecordChange>,
}

impl SqliteRecordStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    /// Subscribes to record change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }

    fn notify(&self, account: &str) {
        // Send fails only when no receiver is subscribed
        let _ = self.changes.send(RecordChange {
            account: account.to_string(),
        });
    }
}

// ============================================================================
// Row mapping
// ============================================================================

/// Parse a DateTime<Utc> from an ISO 8601 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

/// Reconstruct a KeyringRecord from a database row
fn record_from_row(row: &SqliteRow) -> Result<KeyringRecord, StoreError> {
    let id_str: String = row.get("id");
    let account: String = row.get("account");
    let remote_file_id_str: Option<String> = row.get("remote_file_id");
    let title: String = row.get("title");
    let filename: String = row.get("filename");
    let created_at_str: String = row.get("created_at");
    let modified_at_str: String = row.get("modified_at");
    let deleted: i64 = row.get("deleted");

    let id = RecordId::from_str(&id_str).map_err(|e| {
        StoreError::SerializationError(format!("Invalid RecordId '{}': {}", id_str, e))
    })?;

    let remote_file_id = match remote_file_id_str {
        Some(ref s) if !s.is_empty() => Some(RemoteFileId::new(s.clone()).map_err(|e| {
            StoreError::SerializationError(format!("Invalid RemoteFileId '{}': {}", s, e))
        })?),
        _ => None,
    };

    Ok(KeyringRecord {
        id,
        account,
        remote_file_id,
        title,
        filename,
        created_at: parse_datetime(&created_at_str)?,
        modified_at: parse_datetime(&modified_at_str)?,
        deleted: deleted != 0,
    })
}

// ============================================================================
// RecordStore implementation
// ============================================================================

#[async_trait::async_trait]
impl RecordStore for SqliteRecordStore {
    async fn synced_records(&self, account: &str) -> anyhow::Result<Vec<KeyringRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM keyrings WHERE account = ? AND remote_file_id IS NOT NULL \
             ORDER BY title ASC",
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| record_from_row(r).map_err(Into::into))
            .collect()
    }

    async fn pending_records(&self, account: &str) -> anyhow::Result<Vec<KeyringRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM keyrings WHERE account = ? AND remote_file_id IS NULL \
             ORDER BY title ASC",
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| record_from_row(r).map_err(Into::into))
            .collect()
    }

    async fn get(&self, id: &RecordId) -> anyhow::Result<Option<KeyringRecord>> {
        let id_str = id.to_string();

        let row = sqlx::query("SELECT * FROM keyrings WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(record_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_remote_id(
        &self,
        account: &str,
        remote_id: &RemoteFileId,
    ) -> anyhow::Result<Option<KeyringRecord>> {
        let row = sqlx::query("SELECT * FROM keyrings WHERE account = ? AND remote_file_id = ?")
            .bind(account)
            .bind(remote_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(record_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, record: &KeyringRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO keyrings \
             (id, account, remote_file_id, title, filename, created_at, modified_at, deleted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.account)
        .bind(record.remote_file_id.as_ref().map(|r| r.as_str().to_string()))
        .bind(&record.title)
        .bind(&record.filename)
        .bind(record.created_at.to_rfc3339())
        .bind(record.modified_at.to_rfc3339())
        .bind(record.deleted as i64)
        .execute(&self.pool)
        .await?;

        tracing::trace!(record_id = %record.id, account = %record.account, "Inserted keyring record");
        self.notify(&record.account);
        Ok(())
    }

    async fn update(&self, record: &KeyringRecord) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE keyrings SET \
             account = ?, remote_file_id = ?, title = ?, filename = ?, \
             created_at = ?, modified_at = ?, deleted = ? \
             WHERE id = ?",
        )
        .bind(&record.account)
        .bind(record.remote_file_id.as_ref().map(|r| r.as_str().to_string()))
        .bind(&record.title)
        .bind(&record.filename)
        .bind(record.created_at.to_rfc3339())
        .bind(record.modified_at.to_rfc3339())
        .bind(record.deleted as i64)
        .bind(record.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("No keyring record with id {}", record.id);
        }

        tracing::trace!(record_id = %record.id, account = %record.account, "Updated keyring record");
        self.notify(&record.account);
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> anyhow::Result<()> {
        let account: Option<String> = sqlx::query_scalar("SELECT account FROM keyrings WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        sqlx::query("DELETE FROM keyrings WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::trace!(record_id = %id, "Deleted keyring record");
        if let Some(account) = account {
            self.notify(&account);
        }
        Ok(())
    }
}
