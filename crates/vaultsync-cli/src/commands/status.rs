//! Status command - show local sync state for an account
//!
//! Reads only the local stores; no network access, no token needed.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use vaultsync_core::config::Config;
use vaultsync_core::ports::{CursorStore, RecordStore};
use vaultsync_store::{db, SqliteCursorStore, SqliteRecordStore};

use crate::output::{OutputFormat, Printer};

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Account to inspect (e.g. the Google account email)
    #[arg(long)]
    pub account: String,
}

impl StatusCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let printer = Printer::new(format);

        let pool = db::open(Path::new(&config.storage.database_path))
            .await
            .context("Failed to open database")?;
        let records = SqliteRecordStore::new(pool.clone());
        let cursors = SqliteCursorStore::new(pool);

        let cursor = cursors.load(&self.account).await?;
        let synced = records.synced_records(&self.account).await?;
        let pending = records.pending_records(&self.account).await?;
        let tombstoned = synced.iter().chain(pending.iter()).filter(|r| r.is_tombstoned()).count();

        if printer.is_json() {
            printer.json(&serde_json::json!({
                "account": self.account,
                "largest_change_id": cursor.largest_change_id.value(),
                "never_synced": cursor.is_first_sync(),
                "folder_id": cursor.folder_id,
                "synced_records": synced.len(),
                "pending_uploads": pending.len(),
                "pending_deletions": tombstoned,
            }));
            return Ok(());
        }

        printer.success(&format!("Status for {}", self.account));
        if cursor.is_first_sync() {
            printer.info("Never synced (next pass will be a full sync)");
        } else {
            printer.info(&format!("Change cursor: {}", cursor.largest_change_id));
        }
        match &cursor.folder_id {
            Some(id) => printer.info(&format!("Sync folder:   {id}")),
            None => printer.info("Sync folder:   not yet resolved"),
        }
        printer.info(&format!("Synced:        {} keyring(s)", synced.len()));
        printer.info(&format!("Pending:       {} upload(s)", pending.len()));
        if tombstoned > 0 {
            printer.info(&format!("Deleting:      {tombstoned} keyring(s)"));
        }

        for record in &synced {
            let marker = if record.is_tombstoned() { " (deleted)" } else { "" };
            printer.info(&format!("  {} {}{marker}", record.modified_at.format("%Y-%m-%d %H:%M"), record.title));
        }
        for record in &pending {
            printer.info(&format!("  never uploaded: {}", record.title));
        }

        Ok(())
    }
}
