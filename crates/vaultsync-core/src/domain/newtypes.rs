//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for domain identifiers and values. Each newtype
//! ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// RecordId
// ============================================================================

/// Identifier for a local keyring record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random RecordId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a RecordId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid RecordId: {e}")))
    }
}

// ============================================================================
// RemoteFileId
// ============================================================================

/// Opaque identifier assigned by the remote service to a file object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteFileId(String);

impl RemoteFileId {
    /// Create a RemoteFileId, rejecting empty strings
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidRemoteFileId(
                "remote file ID must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteFileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Checksum
// ============================================================================

/// An MD5 content digest in lowercase hex
///
/// Used purely for content-equality testing between local and remote copies,
/// never as a security primitive. Equality is value equality over the digest
/// text; comparing by identity/reference is exactly the defect class this
/// type exists to prevent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Create a Checksum from a hex digest string
    ///
    /// Accepts upper- or lowercase hex and normalizes to lowercase.
    /// The digest must be exactly 32 hex characters (128-bit MD5).
    pub fn new(digest: impl Into<String>) -> Result<Self, DomainError> {
        let digest = digest.into().to_lowercase();
        if digest.len() != 32 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidChecksum(digest));
        }
        Ok(Self(digest))
    }

    /// Get the digest as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps a digest already known to be 32 lowercase hex characters.
    /// Only for the checksum utility, which formats digests itself.
    pub(crate) fn from_valid(digest: String) -> Self {
        debug_assert!(digest.len() == 32 && digest.bytes().all(|b| b.is_ascii_hexdigit()));
        Self(digest)
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ChangeCursor
// ============================================================================

/// Position in the remote change feed
///
/// The remote service numbers every mutation with a monotonically increasing
/// change id. The cursor records the largest id that has been fully applied
/// locally. [`ChangeCursor::UNSYNCED`] (-1) means the account has never
/// completed a sync and the next pass must be a full sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeCursor(i64);

impl ChangeCursor {
    /// Sentinel for "never synced"
    pub const UNSYNCED: ChangeCursor = ChangeCursor(-1);

    /// Create a cursor at the given change id
    #[must_use]
    pub const fn new(change_id: i64) -> Self {
        Self(change_id)
    }

    /// The raw change id
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Whether this cursor forces a full sync
    #[must_use]
    pub const fn is_first_sync(&self) -> bool {
        self.0 < 0
    }

    /// The larger of this cursor and `other`
    ///
    /// Cursor commits go through this so the persisted value never moves
    /// backwards.
    #[must_use]
    pub fn advanced_to(self, other: ChangeCursor) -> Self {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }
}

impl Default for ChangeCursor {
    fn default() -> Self {
        Self::UNSYNCED
    }
}

impl Display for ChangeCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
