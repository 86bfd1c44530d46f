//! MD5 content digests
//!
//! The remote service records an MD5 digest for every file's content; the
//! engine compares that digest against a locally computed one to decide
//! whether bytes actually need to move. Deterministic, platform-independent,
//! and explicitly not a security primitive.

use crate::domain::newtypes::Checksum;

/// Computes the MD5 digest of a byte slice as lowercase hex
#[must_use]
pub fn checksum_bytes(data: &[u8]) -> Checksum {
    let digest = md5::compute(data);
    Checksum::from_valid(format!("{digest:x}"))
}
