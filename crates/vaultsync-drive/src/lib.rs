//! vaultsync Drive - Google Drive API client
//!
//! Typed HTTP client for the Google Drive API, implementing the
//! `RemoteClient` port from `vaultsync-core`. It is a driven (secondary)
//! adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DriveClient`] - `RemoteClient` implementation over `reqwest`
//! - [`AccessTokenProvider`] - trait for supplying OAuth2 access tokens
//! - [`StaticTokenProvider`] - fixed-token provider for tests and scripting
//!
//! ## Error Mapping
//!
//! | HTTP status | `RemoteError` variant   |
//! |-------------|-------------------------|
//! | 401, 403    | `NeedsAuthorization`    |
//! | 404         | `NotFound`              |
//! | other 4xx   | `Http`                  |
//! | 5xx, 429    | `Http` (transient)      |
//! | transport   | `Network`               |

pub mod client;
pub mod model;
pub mod token;

pub use client::DriveClient;
pub use token::{AccessTokenProvider, StaticTokenProvider};
