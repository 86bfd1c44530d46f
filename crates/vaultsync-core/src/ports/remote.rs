//! Remote file service port (driven/secondary port)
//!
//! Thin authenticated interface to the cloud file-storage backend. The DTOs
//! here are port-level types, not domain entities; the engine maps them onto
//! [`KeyringRecord`](crate::domain::KeyringRecord)s.
//!
//! ## Design Notes
//!
//! - Errors are typed ([`RemoteError`]) rather than `anyhow` because the
//!   engine branches on them: `NeedsAuthorization` aborts a pass and is
//!   surfaced to the caller, `NotFound` is treated as a remote deletion.
//! - "Authorization needed" is a result variant, not a thrown signal; the
//!   resume token lets the host resume consent out-of-band.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::newtypes::{Checksum, RemoteFileId};

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by remote client implementations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The service requires renewed user consent before continuing.
    /// The resume token identifies the pending consent request so the host
    /// can surface a prompt and retry later.
    #[error("Authorization required (resume token: {resume_token})")]
    NeedsAuthorization {
        /// Opaque handle for resuming the consent flow
        resume_token: String,
    },

    /// The referenced remote object no longer exists
    #[error("Remote object not found: {0}")]
    NotFound(String),

    /// Non-success HTTP status outside the cases above
    #[error("Remote service error (HTTP {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Transport-level failure (connection refused, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// The service returned a payload the client could not interpret
    #[error("Invalid response from remote service: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Whether a retry on a later trigger may succeed without intervention
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// Port DTOs
// ============================================================================

/// Snapshot of account-level remote state
///
/// Taken at the start of a full sync, *before* listing files, so that
/// changes racing the listing are re-observed by the next incremental pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Id of the account's root folder
    pub root_folder_id: String,
    /// Largest change id the service has assigned so far
    pub largest_change_id: i64,
}

/// A file object as reported by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Service-assigned identifier
    pub id: RemoteFileId,
    /// Display title (also the blob filename locally)
    pub title: String,
    /// MIME type
    pub mime_type: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
    /// MD5 digest of the content, when the service has recorded one
    pub content_checksum: Option<Checksum>,
    /// URL for downloading the content, when available
    pub download_url: Option<String>,
    /// Whether the file sits in the service's trash
    pub trashed: bool,
    /// Ids of the folders containing this file
    pub parent_folder_ids: Vec<String>,
}

/// Metadata for a file about to be created remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRemoteFile {
    /// Display title
    pub title: String,
    /// MIME type
    pub mime_type: String,
    /// Parent folder, `None` for the account root
    pub parent_folder_id: Option<String>,
}

/// Metadata fields that can be patched on an existing remote file
///
/// Only fields set to `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFilePatch {
    /// New title
    pub title: Option<String>,
}

/// One entry from the change feed
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteChange {
    /// Id of the changed file
    pub file_id: RemoteFileId,
    /// The file's current state; `None` when the change is a deletion
    pub file: Option<RemoteFile>,
    /// Whether this change removes the file
    pub deleted: bool,
}

/// One page of the change feed
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePage {
    /// Changes in this page
    pub changes: Vec<RemoteChange>,
    /// Largest change id the service reported with this page
    pub largest_change_id: i64,
    /// Continuation token; `None` on the last page
    pub next_page_token: Option<String>,
}

/// Query predicates for listing remote files
///
/// All fields are optional; unset fields apply no filtering. Predicates are
/// combined with AND logic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    /// Restrict to children of this folder
    pub parent_folder_id: Option<String>,
    /// Restrict to this MIME type
    pub mime_type: Option<String>,
    /// Restrict to this exact title
    pub title: Option<String>,
    /// Restrict by trashed flag
    pub trashed: Option<bool>,
}

impl FileQuery {
    /// Creates an empty query (matches everything)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to children of the given folder
    #[must_use]
    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.parent_folder_id = Some(folder_id.into());
        self
    }

    /// Restricts to the given MIME type
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Restricts to the given exact title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Restricts by trashed flag
    #[must_use]
    pub fn with_trashed(mut self, trashed: bool) -> Self {
        self.trashed = Some(trashed);
        self
    }
}

// ============================================================================
// RemoteClient trait
// ============================================================================

/// Port trait for the remote file-storage service
///
/// All calls are blocking from the engine's point of view and are performed
/// sequentially, file by file. Implementations hold the authentication
/// token; when the service demands renewed consent they return
/// [`RemoteError::NeedsAuthorization`] instead of raising a signal.
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetches the account snapshot (root folder id + largest change id)
    async fn account_snapshot(&self) -> Result<AccountSnapshot, RemoteError>;

    /// Lists file objects matching the query
    async fn list_files(&self, query: &FileQuery) -> Result<Vec<RemoteFile>, RemoteError>;

    /// Fetches a single file object by id
    ///
    /// Returns [`RemoteError::NotFound`] when the id no longer resolves;
    /// callers treat that as a deletion, not a failure.
    async fn get_file(&self, id: &RemoteFileId) -> Result<RemoteFile, RemoteError>;

    /// Creates a new file object, optionally uploading content bytes
    async fn insert_file(
        &self,
        metadata: &NewRemoteFile,
        content: Option<&[u8]>,
    ) -> Result<RemoteFile, RemoteError>;

    /// Updates an existing file's metadata, optionally replacing content
    async fn update_file(
        &self,
        id: &RemoteFileId,
        patch: &RemoteFilePatch,
        content: Option<&[u8]>,
    ) -> Result<RemoteFile, RemoteError>;

    /// Deletes a file object permanently (bypasses the trash)
    async fn delete_file(&self, id: &RemoteFileId) -> Result<(), RemoteError>;

    /// Fetches one page of changes with ids greater than `since`
    ///
    /// Pass the `next_page_token` of the previous page to continue; `None`
    /// starts from the beginning of the range.
    async fn list_changes(
        &self,
        since: i64,
        page_token: Option<&str>,
    ) -> Result<ChangePage, RemoteError>;

    /// Downloads a file's content bytes
    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>, RemoteError>;
}
