//! Domain layer - entities, value types, and merge rules
//!
//! Pure business logic with no I/O. The sync engine and the adapter crates
//! both depend on this module; nothing here depends on them.

pub mod cursor;
pub mod errors;
pub mod merge;
pub mod newtypes;
pub mod record;

pub use cursor::SyncCursor;
pub use errors::DomainError;
pub use merge::{decide, MergeDecision, MergeInputs};
pub use newtypes::{ChangeCursor, Checksum, RecordId, RemoteFileId};
pub use record::{AccountContext, KeyringRecord};
