//! Port definitions (driven/secondary ports)
//!
//! Trait interfaces the sync engine drives and the adapter crates implement:
//! the remote file service, the local record store, the cursor store, and
//! the blob store.

pub mod blob_store;
pub mod cursor_store;
pub mod record_store;
pub mod remote;

pub use blob_store::BlobStore;
pub use cursor_store::CursorStore;
pub use record_store::RecordStore;
pub use remote::{
    AccountSnapshot, ChangePage, FileQuery, NewRemoteFile, RemoteChange, RemoteClient, RemoteError,
    RemoteFile, RemoteFilePatch,
};
