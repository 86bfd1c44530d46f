//! Keyring synchronization engine
//!
//! The [`DriveSyncer`] reconciles the local record store and blob store
//! against the remote file service, one account per pass.
//!
//! ## Pass Flow
//!
//! 1. Resolve the remote sync folder (cached-id fast path)
//! 2. Full sync when the cursor says the account never synced, otherwise
//!    incremental sync from the change feed
//! 3. Upload records that have never been uploaded
//! 4. Commit the change cursor, only once everything above succeeded
//!
//! ## Error Policy
//!
//! `NeedsAuthorization` aborts the pass immediately with the cursor
//! untouched. Failures scoped to a single file are logged, recorded in the
//! report, and skipped so the rest of the pass can proceed; a pass that
//! recorded any such failure withholds the cursor commit, so the skipped
//! changes are replayed on the next pass. Failures that invalidate the
//! pass as a whole (snapshot, folder resolution, change feed) abort it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use vaultsync_core::domain::merge::{decide, MergeDecision, MergeInputs};
use vaultsync_core::domain::newtypes::{ChangeCursor, RemoteFileId};
use vaultsync_core::domain::record::{AccountContext, KeyringRecord};
use vaultsync_core::ports::{
    BlobStore, CursorStore, FileQuery, NewRemoteFile, RecordStore, RemoteClient, RemoteError,
    RemoteFile, RemoteFilePatch,
};

use crate::folder::resolve_sync_folder;
use crate::report::{SyncError, SyncReport};

/// MIME type of keyring files on the remote service
pub const KEYRING_MIME_TYPE: &str = "application/octet-stream";

// ============================================================================
// Syncer trait
// ============================================================================

/// A synchronization engine the host can drive
///
/// One call performs one complete pass for one account. Implementations
/// must be safe to call repeatedly; a pass over an already-converged pair
/// of stores is a no-op.
#[async_trait::async_trait]
pub trait Syncer: Send + Sync {
    /// Performs one synchronization pass for the given account
    async fn perform_sync(&self, ctx: &AccountContext) -> Result<SyncReport, SyncError>;
}

// ============================================================================
// DriveSyncer
// ============================================================================

/// Engine implementation over the core ports
///
/// All collaborators are injected; the engine holds no global state, so a
/// process can run engines for several accounts side by side.
pub struct DriveSyncer {
    /// Remote file service
    remote: Arc<dyn RemoteClient>,
    /// Local record metadata
    records: Arc<dyn RecordStore>,
    /// Durable per-account cursors
    cursors: Arc<dyn CursorStore>,
    /// Local blob content
    blobs: Arc<dyn BlobStore>,
    /// Title of the remote sync folder
    folder_name: String,
    /// Filename extension of keyring files, including the dot
    file_extension: String,
}

/// Per-pass context: resolved once at the start of a pass, never cached
/// across passes.
struct SyncPass<'a> {
    account: &'a str,
    folder_id: String,
}

impl DriveSyncer {
    /// Creates an engine with the given collaborators
    pub fn new(
        remote: Arc<dyn RemoteClient>,
        records: Arc<dyn RecordStore>,
        cursors: Arc<dyn CursorStore>,
        blobs: Arc<dyn BlobStore>,
        folder_name: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            records,
            cursors,
            blobs,
            folder_name: folder_name.into(),
            file_extension: file_extension.into(),
        }
    }

    /// Whether a remote file belongs to this account's sync set
    fn is_relevant(&self, file: &RemoteFile, folder_id: &str) -> bool {
        file.parent_folder_ids.iter().any(|p| p == folder_id)
            && file.title.ends_with(&self.file_extension)
    }

    // ========================================================================
    // Full sync
    // ========================================================================

    /// Reconciles the complete folder listing against the local store
    ///
    /// The change id snapshot is taken *before* listing: anything that
    /// changes while the listing runs is re-observed by the next
    /// incremental pass instead of slipping through the gap.
    async fn full_sync(&self, pass: &SyncPass<'_>, report: &mut SyncReport) -> Result<(), SyncError> {
        let snapshot = self.remote.account_snapshot().await?;
        debug!(
            account = %pass.account,
            snapshot_change_id = snapshot.largest_change_id,
            "Starting full sync"
        );

        let listing = self
            .remote
            .list_files(
                &FileQuery::new()
                    .in_folder(&pass.folder_id)
                    .with_mime_type(KEYRING_MIME_TYPE)
                    .with_trashed(false),
            )
            .await?;

        let mut remote_files: HashMap<RemoteFileId, RemoteFile> = listing
            .into_iter()
            .filter(|f| f.title.ends_with(&self.file_extension))
            .map(|f| (f.id.clone(), f))
            .collect();

        // Each synced local record is visited exactly once
        for mut local in self.records.synced_records(pass.account).await? {
            let Some(remote_id) = local.remote_file_id.clone() else {
                continue;
            };
            let outcome = match remote_files.remove(&remote_id) {
                Some(remote) => self.merge_pair(pass, &mut local, &remote, report).await,
                // The remote file no longer exists: the deletion wins
                None => self.remove_local(pass, &local, report).await,
            };
            if let Err(err) = outcome {
                absorb_failure(report, &local.filename, err)?;
            }
        }

        // Whatever is left in the listing is new to this device
        for (_, remote) in remote_files {
            let title = remote.title.clone();
            if let Err(err) = self.import_remote(pass, &remote, report).await {
                absorb_failure(report, &title, err)?;
            }
        }

        self.upload_pending(pass, report).await?;

        self.commit_cursor(pass, ChangeCursor::new(snapshot.largest_change_id), report)
            .await
    }

    // ========================================================================
    // Incremental sync
    // ========================================================================

    /// Reconciles only the files the change feed reports since `since`
    async fn incremental_sync(
        &self,
        pass: &SyncPass<'_>,
        since: ChangeCursor,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        debug!(account = %pass.account, since = %since, "Starting incremental sync");

        // Collapse the feed into one entry per file; None marks a deletion.
        // A later change for the same file overwrites an earlier one. No
        // filtering happens here: a file renamed or moved out of the sync
        // set must still reach its local pair below, so relevance is only
        // checked for files with no local counterpart.
        let mut changed: HashMap<RemoteFileId, Option<RemoteFile>> = HashMap::new();
        let mut observed = since;
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .remote
                .list_changes(since.value(), page_token.as_deref())
                .await?;
            observed = observed.advanced_to(ChangeCursor::new(page.largest_change_id));

            for change in page.changes {
                if change.deleted {
                    changed.insert(change.file_id, None);
                } else if let Some(file) = change.file {
                    changed.insert(change.file_id, Some(file));
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        // Each local/remote pair is visited exactly once: records the feed
        // did not mention are left alone, without re-fetching them.
        for mut local in self.records.synced_records(pass.account).await? {
            let Some(remote_id) = local.remote_file_id.clone() else {
                continue;
            };
            let outcome = match changed.remove(&remote_id) {
                Some(Some(remote)) => self.merge_pair(pass, &mut local, &remote, report).await,
                Some(None) => self.remove_local(pass, &local, report).await,
                None => continue,
            };
            if let Err(err) = outcome {
                absorb_failure(report, &local.filename, err)?;
            }
        }

        // Leftover additions have no local counterpart yet; only those in
        // the sync set become new local records
        for (_, entry) in changed {
            if let Some(remote) = entry {
                if !self.is_relevant(&remote, &pass.folder_id) {
                    continue;
                }
                let title = remote.title.clone();
                if let Err(err) = self.import_remote(pass, &remote, report).await {
                    absorb_failure(report, &title, err)?;
                }
            }
        }

        self.upload_pending(pass, report).await?;

        self.commit_cursor(pass, observed, report).await
    }

    /// Commits the change cursor, unless a file in this pass failed
    ///
    /// A change the cursor covers must have been applied locally. When any
    /// per-file failure was absorbed, the cursor stays where it was and the
    /// next pass replays the feed from the same position; the files that
    /// did apply are idempotent under replay.
    async fn commit_cursor(
        &self,
        pass: &SyncPass<'_>,
        cursor: ChangeCursor,
        report: &SyncReport,
    ) -> Result<(), SyncError> {
        if !report.errors.is_empty() {
            warn!(
                account = %pass.account,
                failed = report.errors.len(),
                "Holding change cursor back until failed files apply"
            );
            return Ok(());
        }
        self.cursors.store_change_id(pass.account, cursor).await?;
        Ok(())
    }

    // ========================================================================
    // Merge application
    // ========================================================================

    /// Applies the merge decision for one matched local/remote pair
    async fn merge_pair(
        &self,
        pass: &SyncPass<'_>,
        local: &mut KeyringRecord,
        remote: &RemoteFile,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let local_checksum = self.blobs.checksum(pass.account, &local.filename).await?;

        let decision = decide(&MergeInputs {
            local_modified: local.modified_at,
            local_tombstoned: local.is_tombstoned(),
            local_checksum: local_checksum.as_ref(),
            remote_modified: remote.modified_at,
            remote_trashed: remote.trashed,
            remote_checksum: remote.content_checksum.as_ref(),
        });

        debug!(
            account = %pass.account,
            file = %local.filename,
            decision = ?decision,
            "Merging keyring pair"
        );

        match decision {
            MergeDecision::Noop => Ok(()),

            MergeDecision::PushContent => {
                let data = self.blobs.read(pass.account, &local.filename).await?;
                let updated = self
                    .remote
                    .update_file(&remote.id, &self.push_patch(local), Some(&data))
                    .await?;
                local.modified_at = updated.modified_at;
                self.records.update(local).await?;
                report.uploaded += 1;
                Ok(())
            }

            MergeDecision::PushMetadata => {
                let updated = self
                    .remote
                    .update_file(&remote.id, &self.push_patch(local), None)
                    .await?;
                local.modified_at = updated.modified_at;
                self.records.update(local).await?;
                Ok(())
            }

            MergeDecision::DeleteRemote => {
                self.delete_remote_tolerant(&remote.id).await?;
                self.blobs.delete(pass.account, &local.filename).await?;
                self.records.delete(&local.id).await?;
                report.deleted_remote += 1;
                Ok(())
            }

            MergeDecision::PullContent => {
                let data = self.remote.download(remote).await?;
                self.blobs.write(pass.account, &remote.title, &data).await?;
                if local.filename != remote.title {
                    self.blobs.delete(pass.account, &local.filename).await?;
                }
                local.title = remote.title.clone();
                local.filename = remote.title.clone();
                local.modified_at = remote.modified_at;
                self.records.update(local).await?;
                report.downloaded += 1;
                Ok(())
            }

            MergeDecision::PullMetadata => {
                // Content matches; only the name may need to move
                if local.filename != remote.title {
                    let data = self.blobs.read(pass.account, &local.filename).await?;
                    self.blobs.write(pass.account, &remote.title, &data).await?;
                    self.blobs.delete(pass.account, &local.filename).await?;
                }
                local.title = remote.title.clone();
                local.filename = remote.title.clone();
                local.modified_at = remote.modified_at;
                self.records.update(local).await?;
                Ok(())
            }

            MergeDecision::PurgeBoth => {
                self.blobs.delete(pass.account, &local.filename).await?;
                self.records.delete(&local.id).await?;
                // Delete permanently so the trashed copy is never re-imported
                self.delete_remote_tolerant(&remote.id).await?;
                report.deleted_local += 1;
                Ok(())
            }
        }
    }

    /// The metadata patch sent with every push
    ///
    /// The title is always sent so the remote modification timestamp
    /// advances past the local one, making the pair converge.
    fn push_patch(&self, local: &KeyringRecord) -> RemoteFilePatch {
        RemoteFilePatch {
            title: Some(local.filename.clone()),
        }
    }

    /// Deletes a remote file, treating "already gone" as success
    async fn delete_remote_tolerant(&self, id: &RemoteFileId) -> Result<(), SyncError> {
        match self.remote.delete_file(id).await {
            Ok(()) | Err(RemoteError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Creates a local record and blob for a remote file new to this device
    async fn import_remote(
        &self,
        pass: &SyncPass<'_>,
        remote: &RemoteFile,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        if remote.trashed {
            // A trashed file with no local counterpart has nothing to purge
            return Ok(());
        }

        let data = self.remote.download(remote).await?;
        self.blobs.write(pass.account, &remote.title, &data).await?;

        let record = KeyringRecord::from_remote(
            pass.account,
            remote.id.clone(),
            remote.title.clone(),
            remote.created_at,
            remote.modified_at,
        );
        self.records.insert(&record).await?;

        info!(account = %pass.account, file = %remote.title, "Imported remote keyring");
        report.downloaded += 1;
        Ok(())
    }

    /// Removes the local record and blob for a remotely deleted file
    async fn remove_local(
        &self,
        pass: &SyncPass<'_>,
        local: &KeyringRecord,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        self.blobs.delete(pass.account, &local.filename).await?;
        self.records.delete(&local.id).await?;

        info!(account = %pass.account, file = %local.filename, "Removed locally deleted keyring");
        report.deleted_local += 1;
        Ok(())
    }

    // ========================================================================
    // Pending uploads
    // ========================================================================

    /// Uploads records that have never been uploaded
    ///
    /// Runs on every pass, so keyrings created locally between passes reach
    /// the remote side on the next trigger. A tombstoned record that was
    /// never uploaded has nothing to propagate and is removed outright.
    async fn upload_pending(
        &self,
        pass: &SyncPass<'_>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        for mut record in self.records.pending_records(pass.account).await? {
            if record.is_tombstoned() {
                self.blobs.delete(pass.account, &record.filename).await?;
                self.records.delete(&record.id).await?;
                continue;
            }

            let outcome = self.upload_one(pass, &mut record).await;
            match outcome {
                Ok(()) => report.uploaded += 1,
                Err(err) => absorb_failure(report, &record.filename, err)?,
            }
        }
        Ok(())
    }

    async fn upload_one(
        &self,
        pass: &SyncPass<'_>,
        record: &mut KeyringRecord,
    ) -> Result<(), SyncError> {
        let data = self.blobs.read(pass.account, &record.filename).await?;

        let metadata = NewRemoteFile {
            title: record.filename.clone(),
            mime_type: KEYRING_MIME_TYPE.to_string(),
            parent_folder_id: Some(pass.folder_id.clone()),
        };
        let uploaded = self.remote.insert_file(&metadata, Some(&data)).await?;

        record.mark_uploaded(uploaded.id, uploaded.created_at, uploaded.modified_at);
        self.records.update(record).await?;

        info!(account = %pass.account, file = %record.filename, "Uploaded pending keyring");
        Ok(())
    }
}

/// Swallows a per-file failure into the report; authorization failures
/// abort the pass instead.
fn absorb_failure(report: &mut SyncReport, file: &str, err: SyncError) -> Result<(), SyncError> {
    if matches!(err, SyncError::AuthorizationRequired { .. }) {
        return Err(err);
    }
    warn!(file = %file, error = %err, "Skipping file after sync failure");
    report.errors.push(format!("{file}: {err}"));
    Ok(())
}

#[async_trait::async_trait]
impl Syncer for DriveSyncer {
    #[tracing::instrument(skip(self, ctx), fields(account = %ctx.account))]
    async fn perform_sync(&self, ctx: &AccountContext) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let mut report = SyncReport::default();

        let cursor = self.cursors.load(&ctx.account).await?;
        let folder_id =
            resolve_sync_folder(&self.remote, &self.cursors, &ctx.account, &self.folder_name)
                .await?;

        let pass = SyncPass {
            account: &ctx.account,
            folder_id,
        };

        if cursor.largest_change_id.is_first_sync() {
            self.full_sync(&pass, &mut report).await?;
        } else {
            self.incremental_sync(&pass, cursor.largest_change_id, &mut report)
                .await?;
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            account = %ctx.account,
            downloaded = report.downloaded,
            uploaded = report.uploaded,
            deleted_local = report.deleted_local,
            deleted_remote = report.deleted_remote,
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "Sync pass complete"
        );
        Ok(report)
    }
}
