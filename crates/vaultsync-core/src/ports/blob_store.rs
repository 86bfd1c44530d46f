//! Blob store port (driven/secondary port)
//!
//! Local keyring file content on disk: one directory per account, blobs
//! named by their remote title.

use crate::domain::newtypes::Checksum;

/// Port trait for local blob content
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Reads a blob's bytes
    async fn read(&self, account: &str, filename: &str) -> anyhow::Result<Vec<u8>>;

    /// Writes a blob, creating the account directory as needed
    async fn write(&self, account: &str, filename: &str, data: &[u8]) -> anyhow::Result<()>;

    /// Removes a blob; removing an absent blob is not an error
    async fn delete(&self, account: &str, filename: &str) -> anyhow::Result<()>;

    /// MD5 digest of a blob's content
    ///
    /// `None` when the blob does not exist; callers treat an absent digest
    /// as "content differs".
    async fn checksum(&self, account: &str, filename: &str) -> anyhow::Result<Option<Checksum>>;
}
