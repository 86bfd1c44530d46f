//! Filesystem implementation of the `BlobStore` port
//!
//! Lays out blobs as `<root>/<account>/<filename>`. Checksums are computed
//! from the bytes on disk at request time and never cached; the file is the
//! single source of truth for local content.

use std::path::{Path, PathBuf};

use anyhow::Context;

use vaultsync_core::checksum::checksum_bytes;
use vaultsync_core::domain::newtypes::Checksum;
use vaultsync_core::ports::BlobStore;

/// Filesystem-backed blob store rooted at a local directory
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a blob store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, account: &str, filename: &str) -> PathBuf {
        self.root.join(account).join(filename)
    }
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, account: &str, filename: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.blob_path(account, filename);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read blob {}", path.display()))
    }

    async fn write(&self, account: &str, filename: &str, data: &[u8]) -> anyhow::Result<()> {
        let dir = self.root.join(account);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create blob directory {}", dir.display()))?;

        let path = dir.join(filename);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write blob {}", path.display()))?;

        tracing::trace!(path = %path.display(), bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn delete(&self, account: &str, filename: &str) -> anyhow::Result<()> {
        let path = self.blob_path(account, filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::trace!(path = %path.display(), "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete blob {}", path.display())),
        }
    }

    async fn checksum(&self, account: &str, filename: &str) -> anyhow::Result<Option<Checksum>> {
        let path = self.blob_path(account, filename);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(checksum_bytes(&data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read blob {}", path.display())),
        }
    }
}

impl FsBlobStore {
    /// The directory holding a single account's blobs
    pub fn account_dir(&self, account: &str) -> PathBuf {
        self.root.join(account)
    }

    /// The store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}
