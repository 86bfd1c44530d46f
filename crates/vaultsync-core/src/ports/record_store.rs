//! Local record store port (driven/secondary port)
//!
//! Abstracts the local metadata table holding [`KeyringRecord`]s. Uses
//! `anyhow::Result` because storage errors are adapter-specific (SQLite,
//! in-memory, etc.) and don't need domain-level classification.
//!
//! Implementations notify change listeners on every mutation; subscription
//! is an implementation concern (the SQLite store exposes a broadcast
//! channel), not part of the port.

use crate::domain::newtypes::{RecordId, RemoteFileId};
use crate::domain::record::KeyringRecord;

/// Port trait for the local keyring metadata store
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Records that have been uploaded at least once (remote id present)
    async fn synced_records(&self, account: &str) -> anyhow::Result<Vec<KeyringRecord>>;

    /// Records never uploaded (remote id absent)
    async fn pending_records(&self, account: &str) -> anyhow::Result<Vec<KeyringRecord>>;

    /// Fetches a record by its local id
    async fn get(&self, id: &RecordId) -> anyhow::Result<Option<KeyringRecord>>;

    /// Fetches a record by the remote file id it is bound to
    async fn find_by_remote_id(
        &self,
        account: &str,
        remote_id: &RemoteFileId,
    ) -> anyhow::Result<Option<KeyringRecord>>;

    /// Inserts a new record
    async fn insert(&self, record: &KeyringRecord) -> anyhow::Result<()>;

    /// Updates an existing record in place
    async fn update(&self, record: &KeyringRecord) -> anyhow::Result<()>;

    /// Removes a record permanently
    async fn delete(&self, id: &RecordId) -> anyhow::Result<()>;
}
