//! Drive API wire types
//!
//! Serde representations of the Drive JSON payloads, plus conversions into
//! the port-level DTOs from `vaultsync-core`. The API serializes int64
//! fields as JSON strings, so change ids are accepted in either form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vaultsync_core::domain::newtypes::{Checksum, RemoteFileId};
use vaultsync_core::ports::{AccountSnapshot, ChangePage, RemoteChange, RemoteError, RemoteFile};

// ============================================================================
// int64-as-string handling
// ============================================================================

/// An int64 field the API may serialize as a number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Int64Value {
    Num(i64),
    Str(String),
}

impl Int64Value {
    /// The numeric value, or `InvalidResponse` for a malformed string
    pub fn to_i64(&self) -> Result<i64, RemoteError> {
        match self {
            Int64Value::Num(n) => Ok(*n),
            Int64Value::Str(s) => s.parse::<i64>().map_err(|_| {
                RemoteError::InvalidResponse(format!("Not an int64 value: '{}'", s))
            }),
        }
    }
}

// ============================================================================
// Wire payloads
// ============================================================================

/// Response from `GET /about`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutResponse {
    pub root_folder_id: String,
    pub largest_change_id: Int64Value,
}

/// Trash flag container on a file resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Labels {
    #[serde(default)]
    pub trashed: bool,
}

/// Parent folder reference on a file resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentReference {
    pub id: String,
}

/// A file resource as returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    pub id: String,
    pub title: String,
    pub mime_type: String,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    #[serde(default)]
    pub md5_checksum: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub labels: Option<Labels>,
    #[serde(default)]
    pub parents: Vec<ParentReference>,
}

/// Response from `GET /files`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub items: Vec<FileResource>,
}

/// One entry in the change feed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    pub file_id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub file: Option<FileResource>,
}

/// Response from `GET /changes`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeListResponse {
    #[serde(default)]
    pub items: Vec<ChangeItem>,
    pub largest_change_id: Int64Value,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Request body for file insert and metadata update
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<ParentReference>,
}

// ============================================================================
// Conversions to port DTOs
// ============================================================================

impl TryFrom<AboutResponse> for AccountSnapshot {
    type Error = RemoteError;

    fn try_from(about: AboutResponse) -> Result<Self, Self::Error> {
        Ok(AccountSnapshot {
            root_folder_id: about.root_folder_id,
            largest_change_id: about.largest_change_id.to_i64()?,
        })
    }
}

impl TryFrom<FileResource> for RemoteFile {
    type Error = RemoteError;

    fn try_from(file: FileResource) -> Result<Self, Self::Error> {
        let id = RemoteFileId::new(file.id)
            .map_err(|e| RemoteError::InvalidResponse(format!("Bad file id: {}", e)))?;

        let content_checksum = match file.md5_checksum {
            Some(ref digest) => Some(Checksum::new(digest.clone()).map_err(|e| {
                RemoteError::InvalidResponse(format!("Bad md5Checksum '{}': {}", digest, e))
            })?),
            None => None,
        };

        Ok(RemoteFile {
            id,
            title: file.title,
            mime_type: file.mime_type,
            created_at: file.created_date,
            modified_at: file.modified_date,
            content_checksum,
            download_url: file.download_url,
            trashed: file.labels.map(|l| l.trashed).unwrap_or(false),
            parent_folder_ids: file.parents.into_iter().map(|p| p.id).collect(),
        })
    }
}

impl TryFrom<ChangeItem> for RemoteChange {
    type Error = RemoteError;

    fn try_from(change: ChangeItem) -> Result<Self, Self::Error> {
        let file_id = RemoteFileId::new(change.file_id)
            .map_err(|e| RemoteError::InvalidResponse(format!("Bad change file id: {}", e)))?;

        let file = match change.file {
            Some(resource) => Some(RemoteFile::try_from(resource)?),
            None => None,
        };

        Ok(RemoteChange {
            file_id,
            file,
            deleted: change.deleted,
        })
    }
}

impl TryFrom<ChangeListResponse> for ChangePage {
    type Error = RemoteError;

    fn try_from(list: ChangeListResponse) -> Result<Self, Self::Error> {
        let largest_change_id = list.largest_change_id.to_i64()?;
        let changes = list
            .items
            .into_iter()
            .map(RemoteChange::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ChangePage {
            changes,
            largest_change_id,
            next_page_token: list.next_page_token,
        })
    }
}
