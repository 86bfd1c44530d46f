//! Pass outcomes: the summary returned by a sync pass and the errors that
//! abort one.

use thiserror::Error;

use vaultsync_core::ports::RemoteError;

/// Summary of a completed synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Number of keyring files whose content was downloaded
    pub downloaded: u32,
    /// Number of keyring files whose content was uploaded
    pub uploaded: u32,
    /// Number of local records removed because the remote side won
    pub deleted_local: u32,
    /// Number of remote files deleted because the local side won
    pub deleted_remote: u32,
    /// Per-file errors the pass survived (the file is retried next pass)
    pub errors: Vec<String>,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// Whether the pass changed nothing and hit no errors
    #[must_use]
    pub fn is_clean_noop(&self) -> bool {
        self.downloaded == 0
            && self.uploaded == 0
            && self.deleted_local == 0
            && self.deleted_remote == 0
            && self.errors.is_empty()
    }
}

/// Errors that abort a synchronization pass
///
/// Per-file failures do not abort the pass; they land in
/// [`SyncReport::errors`] instead. These variants cover the failures that
/// leave no safe way to continue.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote service demands renewed user consent. The pass stops with
    /// the cursor untouched; the host resumes the consent flow with the
    /// token and retries later.
    #[error("Authorization required (resume token: {resume_token})")]
    AuthorizationRequired {
        /// Opaque handle for resuming the consent flow
        resume_token: String,
    },

    /// The remote service failed in a way that invalidates the pass
    /// (snapshot, folder resolution, or change feed)
    #[error("Remote service error: {0}")]
    Remote(RemoteError),

    /// The local store failed
    #[error("Local store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NeedsAuthorization { resume_token } => {
                SyncError::AuthorizationRequired { resume_token }
            }
            other => SyncError::Remote(other),
        }
    }
}
