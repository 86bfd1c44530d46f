//! CLI command implementations and shared wiring

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use vaultsync_core::config::Config;
use vaultsync_drive::{DriveClient, StaticTokenProvider};
use vaultsync_store::{db, FsBlobStore, SqliteCursorStore, SqliteRecordStore};
use vaultsync_sync::DriveSyncer;

pub mod config;
pub mod status;
pub mod sync;
pub mod watch;

/// Environment variable consulted when `--token` is not given
pub const TOKEN_ENV_VAR: &str = "VAULTSYNC_TOKEN";

/// Loads configuration from the given path, or the default location
pub fn load_config(path: Option<&str>) -> Config {
    let path = path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&path);
    info!(config_path = %path.display(), "Loaded configuration");
    config
}

/// Resolves the OAuth access token from the flag or the environment
pub fn resolve_token(flag: Option<&str>) -> Result<String> {
    if let Some(token) = flag {
        return Ok(token.to_string());
    }
    std::env::var(TOKEN_ENV_VAR).with_context(|| {
        format!("No access token: pass --token or set {TOKEN_ENV_VAR}")
    })
}

/// Everything a sync-running command needs, wired to real adapters
pub struct Services {
    pub engine: Arc<DriveSyncer>,
    pub records: Arc<SqliteRecordStore>,
    pub cursors: Arc<SqliteCursorStore>,
}

/// Opens the database and builds the engine over the configured adapters
pub async fn wire_services(config: &Config, token: &str) -> Result<Services> {
    let pool = db::open(Path::new(&config.storage.database_path))
        .await
        .context("Failed to open database")?;

    let records = Arc::new(SqliteRecordStore::new(pool.clone()));
    let cursors = Arc::new(SqliteCursorStore::new(pool));
    let blobs = Arc::new(FsBlobStore::new(config.storage.blob_root.clone()));

    let tokens = Arc::new(StaticTokenProvider::new(token));
    let remote = Arc::new(DriveClient::new(tokens));

    let engine = Arc::new(DriveSyncer::new(
        remote,
        records.clone(),
        cursors.clone(),
        blobs,
        config.sync.folder_name.clone(),
        config.sync.file_extension.clone(),
    ));

    Ok(Services {
        engine,
        records,
        cursors,
    })
}
