//! vaultsync core - domain model and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `KeyringRecord`, `SyncCursor`, merge decision logic
//! - **Port definitions** - Traits for adapters: `RemoteClient`, `RecordStore`,
//!   `CursorStore`, `BlobStore`
//! - **Checksum utility** - MD5 content digests for transfer gating
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O dependencies.
//! Ports define trait interfaces that adapter crates implement. The sync
//! engine in `vaultsync-sync` orchestrates domain entities through the ports.

pub mod checksum;
pub mod config;
pub mod domain;
pub mod ports;
