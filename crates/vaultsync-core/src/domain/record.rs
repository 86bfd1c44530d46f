//! KeyringRecord domain entity
//!
//! A `KeyringRecord` is the local metadata row for one keyring file: title,
//! filename, timestamps, a soft-delete tombstone flag, and the remote file
//! id once the file has been uploaded at least once.
//!
//! ## Lifecycle
//!
//! ```text
//!   local user creates keyring          remote file discovered
//!            │                                   │
//!            ▼                                   ▼
//!     new_local (no remote id)           from_remote (remote id set)
//!            │                                   │
//!            └──── upload assigns remote id ─────┤
//!                                                ▼
//!                merged each pass; removed when tombstone propagates
//!                remotely or the remote file vanishes from the feed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{RecordId, RemoteFileId};

/// Identity of the account a sync pass runs for
///
/// Constructed per pass and threaded through the engine explicitly; there is
/// no process-wide account state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    /// Account identity (e.g. the user's email address)
    pub account: String,
}

impl AccountContext {
    /// Creates a context for the given account
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

/// Local metadata row for a single keyring file
///
/// `remote_file_id` is `None` until the file has been uploaded at least
/// once; such records are "pending upload". `deleted` is a tombstone set by
/// the user and consumed (then physically removed) by the engine when the
/// deletion has propagated remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyringRecord {
    /// Opaque local identifier
    pub id: RecordId,
    /// Owning account
    pub account: String,
    /// Remote file id, once uploaded
    pub remote_file_id: Option<RemoteFileId>,
    /// Display title (mirrors the remote title after sync)
    pub title: String,
    /// Name of the blob file on disk
    pub filename: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp; drives merge direction
    pub modified_at: DateTime<Utc>,
    /// Soft-delete tombstone
    pub deleted: bool,
}

impl KeyringRecord {
    /// Creates a record for a locally-created keyring (not yet uploaded)
    pub fn new_local(
        account: impl Into<String>,
        title: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            account: account.into(),
            remote_file_id: None,
            title: title.into(),
            filename: filename.into(),
            created_at: now,
            modified_at: now,
            deleted: false,
        }
    }

    /// Creates a record for a keyring discovered remotely
    ///
    /// The blob filename is the remote title, matching the on-disk layout
    /// where blobs are named by their remote title.
    pub fn from_remote(
        account: impl Into<String>,
        remote_file_id: RemoteFileId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        Self {
            id: RecordId::new(),
            account: account.into(),
            remote_file_id: Some(remote_file_id),
            filename: title.clone(),
            title,
            created_at,
            modified_at,
            deleted: false,
        }
    }

    /// Whether this record still awaits its first upload
    #[must_use]
    pub fn is_pending_upload(&self) -> bool {
        self.remote_file_id.is_none()
    }

    /// Whether the user has marked this record deleted
    #[must_use]
    pub fn is_tombstoned(&self) -> bool {
        self.deleted
    }

    /// Records the outcome of a first upload: remote id and the timestamps
    /// the remote service assigned.
    pub fn mark_uploaded(
        &mut self,
        remote_file_id: RemoteFileId,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) {
        self.remote_file_id = Some(remote_file_id);
        self.created_at = created_at;
        self.modified_at = modified_at;
    }
}
