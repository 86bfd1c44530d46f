//! Cursor store port (driven/secondary port)
//!
//! Durable per-account key-value state: the largest applied change id, the
//! cached sync folder id, and a first-launch flag consumed exactly once.
//! All of it must survive process death.

use crate::domain::cursor::SyncCursor;
use crate::domain::newtypes::ChangeCursor;

/// Port trait for durable per-account sync bookkeeping
#[async_trait::async_trait]
pub trait CursorStore: Send + Sync {
    /// Loads the cursor state for an account
    ///
    /// Accounts that have never synced get the default cursor
    /// (`largest_change_id == UNSYNCED`, no folder id).
    async fn load(&self, account: &str) -> anyhow::Result<SyncCursor>;

    /// Commits a new largest applied change id
    ///
    /// Implementations must keep the stored value non-decreasing: a commit
    /// below the current value is a no-op.
    async fn store_change_id(&self, account: &str, cursor: ChangeCursor) -> anyhow::Result<()>;

    /// Caches the resolved sync folder id
    async fn store_folder_id(&self, account: &str, folder_id: &str) -> anyhow::Result<()>;

    /// Drops the cached folder id (it was found stale)
    async fn clear_folder_id(&self, account: &str) -> anyhow::Result<()>;

    /// Returns the first-launch flag and clears it
    ///
    /// True exactly once per account; used by the host to trigger an
    /// immediate initial sync.
    async fn take_first_launch(&self, account: &str) -> anyhow::Result<bool>;
}
