//! Per-account sync cursor state
//!
//! The cursor is the only durable bookkeeping the engine owns: the largest
//! change id fully applied locally, plus the cached id of the remote sync
//! folder. It must survive process death; a crash mid-pass is recovered by
//! re-deriving work from the (not yet advanced) change feed.

use serde::{Deserialize, Serialize};

use super::newtypes::ChangeCursor;

/// Durable per-account sync position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Largest change id fully applied locally; UNSYNCED (-1) before the
    /// first completed sync
    pub largest_change_id: ChangeCursor,
    /// Cached id of the remote sync folder, once resolved
    ///
    /// Treated as a hint: if the folder turns out to have been deleted
    /// remotely, the id is cleared and re-resolved.
    pub folder_id: Option<String>,
}

impl SyncCursor {
    /// Whether the next pass must be a full sync
    #[must_use]
    pub fn is_first_sync(&self) -> bool {
        self.largest_change_id.is_first_sync()
    }
}
