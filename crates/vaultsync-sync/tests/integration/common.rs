//! Shared harness for engine integration tests
//!
//! The engine is exercised against in-memory fakes of all four ports. The
//! `FakeRemote` models the service closely enough for the scenarios here:
//! a change feed with monotonically numbered entries, per-file content with
//! MD5 digests, trash semantics, and injectable failures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use vaultsync_core::checksum::checksum_bytes;
use vaultsync_core::domain::cursor::SyncCursor;
use vaultsync_core::domain::newtypes::{ChangeCursor, Checksum, RecordId, RemoteFileId};
use vaultsync_core::domain::record::{AccountContext, KeyringRecord};
use vaultsync_core::ports::{
    AccountSnapshot, BlobStore, ChangePage, CursorStore, FileQuery, NewRemoteFile, RecordStore,
    RemoteChange, RemoteClient, RemoteError, RemoteFile, RemoteFilePatch,
};
use vaultsync_sync::syncer::KEYRING_MIME_TYPE;
use vaultsync_sync::{DriveSyncer, Syncer};

pub const ACCOUNT: &str = "alice@example.com";
pub const FOLDER_NAME: &str = "Keyrings";
pub const EXTENSION: &str = ".keyring";
pub const RESUME_TOKEN: &str = "resume-fake";

/// A deterministic base instant the tests offset from
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).single().unwrap()
}

// ============================================================================
// FakeRemote
// ============================================================================

struct RemoteState {
    files: HashMap<String, RemoteFile>,
    contents: HashMap<String, Vec<u8>>,
    /// (change id, file id, deleted)
    change_log: Vec<(i64, RemoteFileId, bool)>,
    largest_change_id: i64,
    next_file_number: u32,
    now: DateTime<Utc>,
    page_size: usize,
    auth_revoked: bool,
    /// Downloads for this file id fail with HTTP 503
    failing_download: Option<String>,
}

pub struct FakeRemote {
    state: Mutex<RemoteState>,
    pub download_calls: AtomicU32,
    pub get_file_calls: AtomicU32,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RemoteState {
                files: HashMap::new(),
                contents: HashMap::new(),
                change_log: Vec::new(),
                largest_change_id: 100,
                next_file_number: 0,
                now: base_time(),
                page_size: usize::MAX,
                auth_revoked: false,
                failing_download: None,
            }),
            download_calls: AtomicU32::new(0),
            get_file_calls: AtomicU32::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RemoteState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ------------------------------------------------------------------------
    // Test controls
    // ------------------------------------------------------------------------

    pub fn set_page_size(&self, size: usize) {
        self.lock().page_size = size;
    }

    pub fn revoke_authorization(&self) {
        self.lock().auth_revoked = true;
    }

    pub fn restore_authorization(&self) {
        self.lock().auth_revoked = false;
    }

    pub fn fail_downloads_for(&self, id: &RemoteFileId) {
        self.lock().failing_download = Some(id.as_str().to_string());
    }

    pub fn restore_downloads(&self) {
        self.lock().failing_download = None;
    }

    pub fn advance_clock(&self, seconds: i64) {
        let mut state = self.lock();
        state.now = state.now + Duration::seconds(seconds);
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    pub fn largest_change_id(&self) -> i64 {
        self.lock().largest_change_id
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    pub fn file(&self, id: &RemoteFileId) -> Option<RemoteFile> {
        self.lock().files.get(id.as_str()).cloned()
    }

    pub fn content(&self, id: &RemoteFileId) -> Option<Vec<u8>> {
        self.lock().contents.get(id.as_str()).cloned()
    }

    pub fn find_by_title(&self, title: &str) -> Option<RemoteFile> {
        self.lock().files.values().find(|f| f.title == title).cloned()
    }

    /// Creates a folder directly, bypassing the change log numbering the
    /// engine cares about (folders never appear in keyring merges).
    pub fn seed_folder(&self, title: &str) -> RemoteFileId {
        let mut state = self.lock();
        let id = next_id(&mut state);
        let now = state.now;
        let file = RemoteFile {
            id: id.clone(),
            title: title.to_string(),
            mime_type: "application/vnd.google-apps.folder".to_string(),
            created_at: now,
            modified_at: now,
            content_checksum: None,
            download_url: None,
            trashed: false,
            parent_folder_ids: vec!["root".to_string()],
        };
        state.files.insert(id.as_str().to_string(), file);
        id
    }

    /// Creates a keyring file in the given folder and logs the change
    pub fn seed_file(&self, folder_id: &RemoteFileId, title: &str, content: &[u8]) -> RemoteFileId {
        let mut state = self.lock();
        let id = next_id(&mut state);
        let now = state.now;
        let file = RemoteFile {
            id: id.clone(),
            title: title.to_string(),
            mime_type: KEYRING_MIME_TYPE.to_string(),
            created_at: now,
            modified_at: now,
            content_checksum: Some(checksum_bytes(content)),
            download_url: Some(format!("fake://{}", id.as_str())),
            trashed: false,
            parent_folder_ids: vec![folder_id.as_str().to_string()],
        };
        state.files.insert(id.as_str().to_string(), file);
        state.contents.insert(id.as_str().to_string(), content.to_vec());
        log_change(&mut state, id.clone(), false);
        id
    }

    /// Replaces a file's content, bumping its modification time and logging
    /// the change
    pub fn overwrite_content(&self, id: &RemoteFileId, content: &[u8]) {
        let mut state = self.lock();
        let now = state.now;
        if let Some(file) = state.files.get_mut(id.as_str()) {
            file.content_checksum = Some(checksum_bytes(content));
            file.modified_at = now;
        }
        state.contents.insert(id.as_str().to_string(), content.to_vec());
        log_change(&mut state, id.clone(), false);
    }

    /// Renames a file without touching its content
    pub fn rename_file(&self, id: &RemoteFileId, title: &str) {
        let mut state = self.lock();
        let now = state.now;
        if let Some(file) = state.files.get_mut(id.as_str()) {
            file.title = title.to_string();
            file.modified_at = now;
        }
        log_change(&mut state, id.clone(), false);
    }

    /// Moves a file to the trash, logging the change
    pub fn trash_file(&self, id: &RemoteFileId) {
        let mut state = self.lock();
        let now = state.now;
        if let Some(file) = state.files.get_mut(id.as_str()) {
            file.trashed = true;
            file.modified_at = now;
        }
        log_change(&mut state, id.clone(), false);
    }

    /// Removes a file permanently, logging a deletion change
    pub fn hard_delete_file(&self, id: &RemoteFileId) {
        let mut state = self.lock();
        state.files.remove(id.as_str());
        state.contents.remove(id.as_str());
        log_change(&mut state, id.clone(), true);
    }

    fn check_auth(&self, state: &RemoteState) -> Result<(), RemoteError> {
        if state.auth_revoked {
            Err(RemoteError::NeedsAuthorization {
                resume_token: RESUME_TOKEN.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn next_id(state: &mut RemoteState) -> RemoteFileId {
    state.next_file_number += 1;
    RemoteFileId::new(format!("R{}", state.next_file_number))
        .unwrap_or_else(|_| unreachable!("generated ids are never empty"))
}

fn log_change(state: &mut RemoteState, file_id: RemoteFileId, deleted: bool) {
    state.largest_change_id += 1;
    let id = state.largest_change_id;
    state.change_log.push((id, file_id, deleted));
}

#[async_trait::async_trait]
impl RemoteClient for FakeRemote {
    async fn account_snapshot(&self) -> Result<AccountSnapshot, RemoteError> {
        let state = self.lock();
        self.check_auth(&state)?;
        Ok(AccountSnapshot {
            root_folder_id: "root".to_string(),
            largest_change_id: state.largest_change_id,
        })
    }

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<RemoteFile>, RemoteError> {
        let state = self.lock();
        self.check_auth(&state)?;
        let mut matches: Vec<RemoteFile> = state
            .files
            .values()
            .filter(|f| match &query.parent_folder_id {
                Some(parent) => f.parent_folder_ids.iter().any(|p| p == parent),
                None => true,
            })
            .filter(|f| match &query.mime_type {
                Some(mime) => &f.mime_type == mime,
                None => true,
            })
            .filter(|f| match &query.title {
                Some(title) => &f.title == title,
                None => true,
            })
            .filter(|f| match query.trashed {
                Some(trashed) => f.trashed == trashed,
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(matches)
    }

    async fn get_file(&self, id: &RemoteFileId) -> Result<RemoteFile, RemoteError> {
        self.get_file_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        self.check_auth(&state)?;
        state
            .files
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(id.as_str().to_string()))
    }

    async fn insert_file(
        &self,
        metadata: &NewRemoteFile,
        content: Option<&[u8]>,
    ) -> Result<RemoteFile, RemoteError> {
        let mut state = self.lock();
        self.check_auth(&state)?;
        let id = next_id(&mut state);
        let now = state.now;
        let parent = metadata
            .parent_folder_id
            .clone()
            .unwrap_or_else(|| "root".to_string());
        let file = RemoteFile {
            id: id.clone(),
            title: metadata.title.clone(),
            mime_type: metadata.mime_type.clone(),
            created_at: now,
            modified_at: now,
            content_checksum: content.map(checksum_bytes),
            download_url: content.map(|_| format!("fake://{}", id.as_str())),
            trashed: false,
            parent_folder_ids: vec![parent],
        };
        if let Some(data) = content {
            state.contents.insert(id.as_str().to_string(), data.to_vec());
        }
        state.files.insert(id.as_str().to_string(), file.clone());
        log_change(&mut state, id, false);
        Ok(file)
    }

    async fn update_file(
        &self,
        id: &RemoteFileId,
        patch: &RemoteFilePatch,
        content: Option<&[u8]>,
    ) -> Result<RemoteFile, RemoteError> {
        let mut state = self.lock();
        self.check_auth(&state)?;
        let now = state.now;
        if !state.files.contains_key(id.as_str()) {
            return Err(RemoteError::NotFound(id.as_str().to_string()));
        }
        if let Some(data) = content {
            state.contents.insert(id.as_str().to_string(), data.to_vec());
        }
        let file = state
            .files
            .get_mut(id.as_str())
            .ok_or_else(|| RemoteError::NotFound(id.as_str().to_string()))?;
        if let Some(title) = &patch.title {
            file.title = title.clone();
        }
        if let Some(data) = content {
            file.content_checksum = Some(checksum_bytes(data));
        }
        file.modified_at = now;
        let updated = file.clone();
        log_change(&mut state, id.clone(), false);
        Ok(updated)
    }

    async fn delete_file(&self, id: &RemoteFileId) -> Result<(), RemoteError> {
        let mut state = self.lock();
        self.check_auth(&state)?;
        if state.files.remove(id.as_str()).is_none() {
            return Err(RemoteError::NotFound(id.as_str().to_string()));
        }
        state.contents.remove(id.as_str());
        log_change(&mut state, id.clone(), true);
        Ok(())
    }

    async fn list_changes(
        &self,
        since: i64,
        page_token: Option<&str>,
    ) -> Result<ChangePage, RemoteError> {
        let state = self.lock();
        self.check_auth(&state)?;

        let pending: Vec<&(i64, RemoteFileId, bool)> = state
            .change_log
            .iter()
            .filter(|(change_id, _, _)| *change_id > since)
            .collect();

        let start: usize = match page_token {
            Some(token) => token
                .parse()
                .map_err(|_| RemoteError::InvalidResponse(format!("Bad page token: {token}")))?,
            None => 0,
        };
        let end = (start + state.page_size).min(pending.len());

        let changes = pending[start..end]
            .iter()
            .map(|(_, file_id, deleted)| {
                // The feed reports a file's current state, not a snapshot
                let file = state.files.get(file_id.as_str()).cloned();
                RemoteChange {
                    file_id: file_id.clone(),
                    deleted: *deleted || file.is_none(),
                    file,
                }
            })
            .collect();

        Ok(ChangePage {
            changes,
            largest_change_id: state.largest_change_id,
            next_page_token: (end < pending.len()).then(|| end.to_string()),
        })
    }

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>, RemoteError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        self.check_auth(&state)?;
        if state.failing_download.as_deref() == Some(file.id.as_str()) {
            return Err(RemoteError::Http {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        state
            .contents
            .get(file.id.as_str())
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(file.id.as_str().to_string()))
    }
}

// ============================================================================
// In-memory stores
// ============================================================================

#[derive(Default)]
pub struct MemRecordStore {
    records: Mutex<HashMap<RecordId, KeyringRecord>>,
}

impl MemRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn sorted(&self, account: &str, pending: bool) -> Vec<KeyringRecord> {
        let mut records: Vec<KeyringRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.account == account && r.is_pending_upload() == pending)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.title.cmp(&b.title));
        records
    }
}

#[async_trait::async_trait]
impl RecordStore for MemRecordStore {
    async fn synced_records(&self, account: &str) -> anyhow::Result<Vec<KeyringRecord>> {
        Ok(self.sorted(account, false))
    }

    async fn pending_records(&self, account: &str) -> anyhow::Result<Vec<KeyringRecord>> {
        Ok(self.sorted(account, true))
    }

    async fn get(&self, id: &RecordId) -> anyhow::Result<Option<KeyringRecord>> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn find_by_remote_id(
        &self,
        account: &str,
        remote_id: &RemoteFileId,
    ) -> anyhow::Result<Option<KeyringRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.account == account && r.remote_file_id.as_ref() == Some(remote_id))
            .cloned())
    }

    async fn insert(&self, record: &KeyringRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &KeyringRecord) -> anyhow::Result<()> {
        let mut records = self.records.lock().unwrap();
        if !records.contains_key(&record.id) {
            anyhow::bail!("No keyring record with id {}", record.id);
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> anyhow::Result<()> {
        self.records.lock().unwrap().remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemCursorStore {
    cursors: Mutex<HashMap<String, SyncCursor>>,
    launched: Mutex<HashMap<String, bool>>,
}

impl MemCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn change_id(&self, account: &str) -> i64 {
        self.cursors
            .lock()
            .unwrap()
            .get(account)
            .map(|c| c.largest_change_id.value())
            .unwrap_or(ChangeCursor::UNSYNCED.value())
    }

    pub fn folder_id(&self, account: &str) -> Option<String> {
        self.cursors
            .lock()
            .unwrap()
            .get(account)
            .and_then(|c| c.folder_id.clone())
    }

    pub fn set_folder_id(&self, account: &str, folder_id: &str) {
        self.cursors
            .lock()
            .unwrap()
            .entry(account.to_string())
            .or_default()
            .folder_id = Some(folder_id.to_string());
    }
}

#[async_trait::async_trait]
impl CursorStore for MemCursorStore {
    async fn load(&self, account: &str) -> anyhow::Result<SyncCursor> {
        Ok(self
            .cursors
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn store_change_id(&self, account: &str, cursor: ChangeCursor) -> anyhow::Result<()> {
        let mut cursors = self.cursors.lock().unwrap();
        let entry = cursors.entry(account.to_string()).or_default();
        entry.largest_change_id = entry.largest_change_id.advanced_to(cursor);
        Ok(())
    }

    async fn store_folder_id(&self, account: &str, folder_id: &str) -> anyhow::Result<()> {
        self.cursors
            .lock()
            .unwrap()
            .entry(account.to_string())
            .or_default()
            .folder_id = Some(folder_id.to_string());
        Ok(())
    }

    async fn clear_folder_id(&self, account: &str) -> anyhow::Result<()> {
        if let Some(cursor) = self.cursors.lock().unwrap().get_mut(account) {
            cursor.folder_id = None;
        }
        Ok(())
    }

    async fn take_first_launch(&self, account: &str) -> anyhow::Result<bool> {
        let mut launched = self.launched.lock().unwrap();
        Ok(!std::mem::replace(
            launched.entry(account.to_string()).or_insert(false),
            true,
        ))
    }
}

#[derive(Default)]
pub struct MemBlobStore {
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, account: &str, filename: &str) -> bool {
        self.blobs
            .lock()
            .unwrap()
            .contains_key(&(account.to_string(), filename.to_string()))
    }

    pub fn get(&self, account: &str, filename: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(&(account.to_string(), filename.to_string()))
            .cloned()
    }

    pub fn put(&self, account: &str, filename: &str, data: &[u8]) {
        self.blobs
            .lock()
            .unwrap()
            .insert((account.to_string(), filename.to_string()), data.to_vec());
    }

    pub fn remove(&self, account: &str, filename: &str) {
        self.blobs
            .lock()
            .unwrap()
            .remove(&(account.to_string(), filename.to_string()));
    }
}

#[async_trait::async_trait]
impl BlobStore for MemBlobStore {
    async fn read(&self, account: &str, filename: &str) -> anyhow::Result<Vec<u8>> {
        self.get(account, filename)
            .ok_or_else(|| anyhow::anyhow!("No blob {filename} for account {account}"))
    }

    async fn write(&self, account: &str, filename: &str, data: &[u8]) -> anyhow::Result<()> {
        self.put(account, filename, data);
        Ok(())
    }

    async fn delete(&self, account: &str, filename: &str) -> anyhow::Result<()> {
        self.remove(account, filename);
        Ok(())
    }

    async fn checksum(&self, account: &str, filename: &str) -> anyhow::Result<Option<Checksum>> {
        Ok(self.get(account, filename).map(|data| checksum_bytes(&data)))
    }
}

// ============================================================================
// Harness
// ============================================================================

/// One engine wired to fakes, plus handles for assertions
pub struct Harness {
    pub remote: Arc<FakeRemote>,
    pub records: Arc<MemRecordStore>,
    pub cursors: Arc<MemCursorStore>,
    pub blobs: Arc<MemBlobStore>,
    pub engine: DriveSyncer,
    pub ctx: AccountContext,
}

impl Harness {
    pub fn new() -> Self {
        let remote = Arc::new(FakeRemote::new());
        let records = Arc::new(MemRecordStore::new());
        let cursors = Arc::new(MemCursorStore::new());
        let blobs = Arc::new(MemBlobStore::new());
        let engine = DriveSyncer::new(
            remote.clone(),
            records.clone(),
            cursors.clone(),
            blobs.clone(),
            FOLDER_NAME,
            EXTENSION,
        );
        Self {
            remote,
            records,
            cursors,
            blobs,
            engine,
            ctx: AccountContext::new(ACCOUNT),
        }
    }

    /// Harness with the sync folder already present remotely
    pub fn with_folder() -> (Self, RemoteFileId) {
        let harness = Self::new();
        let folder = harness.remote.seed_folder(FOLDER_NAME);
        (harness, folder)
    }

    pub async fn sync(&self) -> vaultsync_sync::SyncReport {
        self.engine
            .perform_sync(&self.ctx)
            .await
            .expect("sync pass should succeed")
    }

    /// Inserts a local record plus its blob, as keyring creation would
    pub async fn create_local(&self, title: &str, content: &[u8]) -> KeyringRecord {
        let record = KeyringRecord::new_local(ACCOUNT, title, title);
        self.blobs.put(ACCOUNT, title, content);
        self.records.insert(&record).await.unwrap();
        record
    }

    /// Marks a synced record tombstoned with a fresh modification time
    pub async fn tombstone(&self, id: &RecordId, modified_at: DateTime<Utc>) {
        let mut record = self.records.get(id).await.unwrap().unwrap();
        record.deleted = true;
        record.modified_at = modified_at;
        self.records.update(&record).await.unwrap();
    }
}
