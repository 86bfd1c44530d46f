//! vaultsync Store - Local state persistence
//!
//! SQLite-based store for:
//! - Keyring record metadata
//! - Per-account sync cursors (change id, folder id, first-launch flag)
//!
//! plus a filesystem-backed blob store for keyring file content.
//!
//! ## Architecture
//!
//! This crate implements the `RecordStore`, `CursorStore`, and `BlobStore`
//! ports from `vaultsync-core`. It is a driven (secondary) adapter in the
//! hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`db::open`] / [`db::open_in_memory`] - connection setup and schema
//! - [`SqliteRecordStore`] - `RecordStore` implementation with a change
//!   broadcast channel
//! - [`SqliteCursorStore`] - `CursorStore` implementation
//! - [`FsBlobStore`] - `BlobStore` implementation over a local directory
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use vaultsync_store::{db, SqliteRecordStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = db::open(Path::new("/home/user/.local/share/vaultsync/vaultsync.db")).await?;
//! let records = SqliteRecordStore::new(pool);
//! // Use records as RecordStore...
//! # Ok(())
//! # }
//! ```

pub mod blobs;
pub mod cursor;
pub mod db;
pub mod records;

pub use blobs::FsBlobStore;
pub use cursor::SqliteCursorStore;
pub use records::{RecordChange, SqliteRecordStore};

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::QueryFailed(e.to_string())
    }
}
