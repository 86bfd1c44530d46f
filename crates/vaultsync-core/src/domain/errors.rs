//! Domain error types

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote file identifier (empty or malformed)
    #[error("Invalid remote file ID: {0}")]
    InvalidRemoteFileId(String),

    /// Invalid checksum format (expected hex MD5 digest)
    #[error("Invalid checksum format: {0}")]
    InvalidChecksum(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
