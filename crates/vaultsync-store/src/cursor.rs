//! SQLite implementation of the `CursorStore` port
//!
//! One row per account in `sync_state`. The change id column only moves
//! forward: commits go through `MAX(largest_change_id, excluded)` so a
//! concurrent or replayed commit can never rewind the cursor.

use sqlx::{Row, SqlitePool};

use vaultsync_core::domain::cursor::SyncCursor;
use vaultsync_core::domain::newtypes::ChangeCursor;
use vaultsync_core::ports::CursorStore;

/// SQLite-based implementation of the cursor store port
pub struct SqliteCursorStore {
    pool: SqlitePool,
}

impl SqliteCursorStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CursorStore for SqliteCursorStore {
    async fn load(&self, account: &str) -> anyhow::Result<SyncCursor> {
        let row = sqlx::query("SELECT largest_change_id, folder_id FROM sync_state WHERE account = ?")
            .bind(account)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let change_id: i64 = r.get("largest_change_id");
                let folder_id: Option<String> = r.get("folder_id");
                Ok(SyncCursor {
                    largest_change_id: ChangeCursor::new(change_id),
                    folder_id,
                })
            }
            None => Ok(SyncCursor::default()),
        }
    }

    async fn store_change_id(&self, account: &str, cursor: ChangeCursor) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sync_state (account, largest_change_id) VALUES (?, ?) \
             ON CONFLICT (account) DO UPDATE SET \
             largest_change_id = MAX(largest_change_id, excluded.largest_change_id)",
        )
        .bind(account)
        .bind(cursor.value())
        .execute(&self.pool)
        .await?;

        tracing::debug!(account = %account, cursor = %cursor, "Committed change cursor");
        Ok(())
    }

    async fn store_folder_id(&self, account: &str, folder_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sync_state (account, folder_id) VALUES (?, ?) \
             ON CONFLICT (account) DO UPDATE SET folder_id = excluded.folder_id",
        )
        .bind(account)
        .bind(folder_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(account = %account, folder_id = %folder_id, "Cached sync folder id");
        Ok(())
    }

    async fn clear_folder_id(&self, account: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE sync_state SET folder_id = NULL WHERE account = ?")
            .bind(account)
            .execute(&self.pool)
            .await?;

        tracing::debug!(account = %account, "Cleared cached sync folder id");
        Ok(())
    }

    async fn take_first_launch(&self, account: &str) -> anyhow::Result<bool> {
        let current: Option<i64> =
            sqlx::query_scalar("SELECT first_launch FROM sync_state WHERE account = ?")
                .bind(account)
                .fetch_optional(&self.pool)
                .await?;

        // Absent row means the account has never been seen: first launch.
        let first_launch = current.map(|v| v != 0).unwrap_or(true);

        sqlx::query(
            "INSERT INTO sync_state (account, first_launch) VALUES (?, 0) \
             ON CONFLICT (account) DO UPDATE SET first_launch = 0",
        )
        .bind(account)
        .execute(&self.pool)
        .await?;

        Ok(first_launch)
    }
}
