//! Google Drive API client
//!
//! Provides a typed HTTP client implementing the `RemoteClient` port.
//! Handles authentication headers, JSON deserialization, endpoint
//! construction, and HTTP status mapping onto [`RemoteError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vaultsync_core::ports::RemoteClient;
//! use vaultsync_drive::{DriveClient, StaticTokenProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new(Arc::new(StaticTokenProvider::new("access-token")));
//! let snapshot = client.account_snapshot().await?;
//! println!("largest change id: {}", snapshot.largest_change_id);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use vaultsync_core::domain::newtypes::RemoteFileId;
use vaultsync_core::ports::{
    AccountSnapshot, ChangePage, FileQuery, NewRemoteFile, RemoteClient, RemoteError, RemoteFile,
    RemoteFilePatch,
};

use crate::model::{
    AboutResponse, ChangeListResponse, FileListResponse, FileMetadataBody, FileResource,
    ParentReference,
};
use crate::token::AccessTokenProvider;

/// Base URL for the Drive API
const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v2";

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Drive API calls
///
/// Wraps `reqwest::Client` with bearer authentication and base URL
/// construction. Tokens come from the injected [`AccessTokenProvider`]
/// before every request, so refreshes happen transparently.
pub struct DriveClient {
    /// The underlying HTTP client
    http: Client,
    /// Base URL for API requests
    base_url: String,
    /// Supplier of OAuth2 bearer tokens
    tokens: Arc<dyn AccessTokenProvider>,
}

impl DriveClient {
    /// Creates a new client against the production Drive API
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http: Client::new(),
            base_url: DRIVE_BASE_URL.to_string(),
            tokens,
        }
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(tokens: Arc<dyn AccessTokenProvider>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            tokens,
        }
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.http.request(method, &url).bearer_auth(token))
    }

    /// Sends a request and maps transport errors and non-success statuses
    ///
    /// `subject` names the object being operated on, for `NotFound` messages.
    async fn send(&self, builder: RequestBuilder, subject: &str) -> Result<Response, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::NeedsAuthorization {
                resume_token: self.tokens.consent_handle(),
            },
            StatusCode::NOT_FOUND => RemoteError::NotFound(subject.to_string()),
            _ => RemoteError::Http {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Deserializes a JSON response body
    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    /// Uploads content bytes for an existing file and returns its new state
    async fn upload_media(&self, id: &RemoteFileId, content: &[u8]) -> Result<FileResource, RemoteError> {
        let path = format!("/files/{}?uploadType=media", id.as_str());
        debug!(file_id = %id, bytes = content.len(), "Uploading file content");

        let builder = self
            .request(Method::PUT, &path)
            .await?
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content.to_vec());

        let response = self.send(builder, id.as_str()).await?;
        Self::json(response).await
    }
}

/// Builds the `q` search expression for a file listing
fn build_search_query(query: &FileQuery) -> Option<String> {
    let mut clauses = Vec::new();

    if let Some(ref folder) = query.parent_folder_id {
        clauses.push(format!("'{}' in parents", folder));
    }
    if let Some(ref mime) = query.mime_type {
        clauses.push(format!("mimeType = '{}'", mime));
    }
    if let Some(ref title) = query.title {
        clauses.push(format!("title = '{}'", title.replace('\'', "\\'")));
    }
    if let Some(trashed) = query.trashed {
        clauses.push(format!("trashed = {}", trashed));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" and "))
    }
}

// ============================================================================
// RemoteClient implementation
// ============================================================================

#[async_trait::async_trait]
impl RemoteClient for DriveClient {
    async fn account_snapshot(&self) -> Result<AccountSnapshot, RemoteError> {
        debug!("Fetching account snapshot from /about");

        let builder = self.request(Method::GET, "/about").await?;
        let response = self.send(builder, "about").await?;
        let about: AboutResponse = Self::json(response).await?;

        about.try_into()
    }

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<RemoteFile>, RemoteError> {
        let mut builder = self.request(Method::GET, "/files").await?;
        if let Some(q) = build_search_query(query) {
            debug!(q = %q, "Listing files");
            builder = builder.query(&[("q", q)]);
        } else {
            debug!("Listing all files");
        }

        let response = self.send(builder, "files").await?;
        let list: FileListResponse = Self::json(response).await?;

        list.items.into_iter().map(RemoteFile::try_from).collect()
    }

    async fn get_file(&self, id: &RemoteFileId) -> Result<RemoteFile, RemoteError> {
        let path = format!("/files/{}", id.as_str());
        debug!(file_id = %id, "Fetching file metadata");

        let builder = self.request(Method::GET, &path).await?;
        let response = self.send(builder, id.as_str()).await?;
        let resource: FileResource = Self::json(response).await?;

        resource.try_into()
    }

    async fn insert_file(
        &self,
        metadata: &NewRemoteFile,
        content: Option<&[u8]>,
    ) -> Result<RemoteFile, RemoteError> {
        debug!(title = %metadata.title, "Creating remote file");

        let body = FileMetadataBody {
            title: Some(metadata.title.clone()),
            mime_type: Some(metadata.mime_type.clone()),
            parents: metadata
                .parent_folder_id
                .iter()
                .map(|id| ParentReference { id: id.clone() })
                .collect(),
        };

        let builder = self.request(Method::POST, "/files").await?.json(&body);
        let response = self.send(builder, &metadata.title).await?;
        let mut resource: FileResource = Self::json(response).await?;

        if let Some(bytes) = content {
            let id = RemoteFileId::new(resource.id.clone())
                .map_err(|e| RemoteError::InvalidResponse(format!("Bad file id: {}", e)))?;
            resource = self.upload_media(&id, bytes).await?;
        }

        resource.try_into()
    }

    async fn update_file(
        &self,
        id: &RemoteFileId,
        patch: &RemoteFilePatch,
        content: Option<&[u8]>,
    ) -> Result<RemoteFile, RemoteError> {
        let mut latest: Option<FileResource> = None;

        if patch.title.is_some() {
            let path = format!("/files/{}", id.as_str());
            debug!(file_id = %id, "Updating file metadata");

            let body = FileMetadataBody {
                title: patch.title.clone(),
                mime_type: None,
                parents: Vec::new(),
            };
            let builder = self.request(Method::PUT, &path).await?.json(&body);
            let response = self.send(builder, id.as_str()).await?;
            latest = Some(Self::json(response).await?);
        }

        if let Some(bytes) = content {
            latest = Some(self.upload_media(id, bytes).await?);
        }

        match latest {
            Some(resource) => resource.try_into(),
            // Nothing to change; report the current remote state
            None => self.get_file(id).await,
        }
    }

    async fn delete_file(&self, id: &RemoteFileId) -> Result<(), RemoteError> {
        let path = format!("/files/{}", id.as_str());
        debug!(file_id = %id, "Deleting remote file");

        let builder = self.request(Method::DELETE, &path).await?;
        self.send(builder, id.as_str()).await?;
        Ok(())
    }

    async fn list_changes(
        &self,
        since: i64,
        page_token: Option<&str>,
    ) -> Result<ChangePage, RemoteError> {
        let mut builder = self
            .request(Method::GET, "/changes")
            .await?
            .query(&[("includeDeleted", "true")]);

        // startChangeId is an inclusive lower bound
        if since >= 0 {
            builder = builder.query(&[("startChangeId", (since + 1).to_string())]);
        }
        if let Some(token) = page_token {
            builder = builder.query(&[("pageToken", token)]);
        }

        debug!(since, page_token = ?page_token, "Listing changes");

        let response = self.send(builder, "changes").await?;
        let list: ChangeListResponse = Self::json(response).await?;

        list.try_into()
    }

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>, RemoteError> {
        let url = file.download_url.as_ref().ok_or_else(|| {
            RemoteError::InvalidResponse(format!("File {} has no download URL", file.id))
        })?;

        debug!(file_id = %file.id, "Downloading file content");

        let token = self.tokens.access_token().await?;
        let builder = self.http.get(url).bearer_auth(token);
        let response = self.send(builder, file.id.as_str()).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        debug!(file_id = %file.id, bytes = bytes.len(), "Download complete");
        Ok(bytes.to_vec())
    }
}
