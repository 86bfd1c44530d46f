//! vaultsync Sync - keyring synchronization engine
//!
//! Orchestrates bidirectional synchronization between the local keyring
//! store and the remote file service, using the ports defined in
//! `vaultsync-core`.
//!
//! ## Sync Flow
//!
//! 1. **Folder resolution**: find or create the remote sync folder, with a
//!    cached-id fast path
//! 2. **Full sync** (first pass): snapshot the change cursor, list the
//!    folder, reconcile everything
//! 3. **Incremental sync** (later passes): page the change feed since the
//!    stored cursor and reconcile only what changed
//! 4. **Bookkeeping**: upload pending local records, commit the cursor,
//!    return a summary
//!
//! ## Key Components
//!
//! - [`Syncer`] - trait the host and scheduler drive
//! - [`DriveSyncer`] - the engine implementation
//! - [`SyncScheduler`] - periodic and on-demand pass triggering
//! - [`SyncReport`] / [`SyncError`] - pass outcomes

pub mod folder;
pub mod report;
pub mod scheduler;
pub mod syncer;

pub use report::{SyncError, SyncReport};
pub use scheduler::SyncScheduler;
pub use syncer::{DriveSyncer, Syncer};
