//! Merge decision logic for one local/remote keyring pair
//!
//! The decision is fully determined by the sign of the timestamp difference
//! and the deleted/trashed flags; the checksum only gates whether content
//! is transferred alongside metadata. Keeping this as a pure function makes
//! the whole conflict table unit-testable without any I/O.
//!
//! Checksum comparison is total and defensive: a missing digest on either
//! side is treated as "differs", never as an error, and digests compare by
//! value.

use chrono::{DateTime, Utc};

use super::newtypes::Checksum;

/// Outcome of merging one local record against its remote counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Local is newer and tombstoned: delete the remote file, then remove
    /// the local record
    DeleteRemote,
    /// Local is newer and content differs: upload bytes and metadata in one
    /// update
    PushContent,
    /// Local is newer but content matches: update remote metadata only
    PushMetadata,
    /// Remote is newer and trashed: remove the local blob and record, and
    /// delete the remote file permanently so it is never re-imported
    PurgeBoth,
    /// Remote is newer and content differs: download bytes, then refresh
    /// local title and timestamp
    PullContent,
    /// Remote is newer but content matches: refresh local title and
    /// timestamp only
    PullMetadata,
    /// Timestamps are equal: already in sync
    Noop,
}

/// Everything the merge decision depends on
#[derive(Debug, Clone, Copy)]
pub struct MergeInputs<'a> {
    /// Local record modification time
    pub local_modified: DateTime<Utc>,
    /// Local tombstone flag
    pub local_tombstoned: bool,
    /// Digest of the local blob, if the blob exists
    pub local_checksum: Option<&'a Checksum>,
    /// Remote modification time
    pub remote_modified: DateTime<Utc>,
    /// Remote trashed flag
    pub remote_trashed: bool,
    /// Digest recorded by the remote service, if any
    pub remote_checksum: Option<&'a Checksum>,
}

/// Returns true only when both digests are present and equal by value
fn checksums_equal(local: Option<&Checksum>, remote: Option<&Checksum>) -> bool {
    match (local, remote) {
        (Some(local), Some(remote)) => local == remote,
        _ => false,
    }
}

/// Decides the merge action for one matched local/remote pair
#[must_use]
pub fn decide(inputs: &MergeInputs<'_>) -> MergeDecision {
    if inputs.local_modified > inputs.remote_modified {
        if inputs.local_tombstoned {
            MergeDecision::DeleteRemote
        } else if checksums_equal(inputs.local_checksum, inputs.remote_checksum) {
            MergeDecision::PushMetadata
        } else {
            MergeDecision::PushContent
        }
    } else if inputs.remote_modified > inputs.local_modified {
        if inputs.remote_trashed {
            MergeDecision::PurgeBoth
        } else if checksums_equal(inputs.local_checksum, inputs.remote_checksum) {
            MergeDecision::PullMetadata
        } else {
            MergeDecision::PullContent
        }
    } else {
        MergeDecision::Noop
    }
}
