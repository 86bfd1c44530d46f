//! Remote sync folder resolution
//!
//! The engine keeps all keyring files inside one named folder at the
//! account root. The folder's id is cached in the cursor store; the cache
//! is only trusted after the folder is confirmed to still exist, so a
//! folder deleted (or trashed) out-of-band triggers transparent
//! re-resolution instead of writes into a dead parent.

use std::sync::Arc;

use tracing::{debug, info, warn};

use vaultsync_core::ports::{CursorStore, FileQuery, NewRemoteFile, RemoteClient, RemoteError};

use crate::report::SyncError;

/// MIME type the remote service uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Resolves the id of the account's sync folder, creating it if needed
///
/// Resolution order:
/// 1. Cached id, verified with a metadata fetch
/// 2. Search by title at the account root
/// 3. Create the folder
///
/// The resolved id is cached for the next pass.
pub async fn resolve_sync_folder(
    remote: &Arc<dyn RemoteClient>,
    cursors: &Arc<dyn CursorStore>,
    account: &str,
    folder_name: &str,
) -> Result<String, SyncError> {
    // Fast path: cached id, if the folder still exists and is not trashed
    if let Some(cached) = cursors.load(account).await?.folder_id {
        match remote.get_file(&parse_folder_id(&cached)?).await {
            Ok(folder) if !folder.trashed => {
                debug!(account = %account, folder_id = %cached, "Using cached sync folder");
                return Ok(cached);
            }
            Ok(_) => {
                warn!(account = %account, folder_id = %cached, "Cached sync folder is trashed, re-resolving");
                cursors.clear_folder_id(account).await?;
            }
            Err(RemoteError::NotFound(_)) => {
                warn!(account = %account, folder_id = %cached, "Cached sync folder is gone, re-resolving");
                cursors.clear_folder_id(account).await?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    // Search by title at the account root
    let query = FileQuery::new()
        .with_title(folder_name)
        .with_mime_type(FOLDER_MIME_TYPE)
        .with_trashed(false);
    let matches = remote.list_files(&query).await?;

    if let Some(folder) = matches.into_iter().next() {
        let id = folder.id.as_str().to_string();
        debug!(account = %account, folder_id = %id, "Found existing sync folder");
        cursors.store_folder_id(account, &id).await?;
        return Ok(id);
    }

    // Not there: create it
    let metadata = NewRemoteFile {
        title: folder_name.to_string(),
        mime_type: FOLDER_MIME_TYPE.to_string(),
        parent_folder_id: None,
    };
    let created = remote.insert_file(&metadata, None).await?;
    let id = created.id.as_str().to_string();

    info!(account = %account, folder_id = %id, folder_name = %folder_name, "Created sync folder");
    cursors.store_folder_id(account, &id).await?;
    Ok(id)
}

/// Wraps a cached folder id string back into a validated id
fn parse_folder_id(cached: &str) -> Result<vaultsync_core::domain::newtypes::RemoteFileId, SyncError> {
    vaultsync_core::domain::newtypes::RemoteFileId::new(cached)
        .map_err(|e| SyncError::Store(anyhow::anyhow!("Corrupt cached folder id: {e}")))
}
