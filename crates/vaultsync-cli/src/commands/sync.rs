//! Sync command - run one synchronization pass
//!
//! Wires the Drive client and the SQLite stores to the engine, runs a
//! single pass for the given account, and prints the report.

use anyhow::Result;
use clap::Args;

use vaultsync_core::config::Config;
use vaultsync_core::domain::record::AccountContext;
use vaultsync_sync::{SyncError, SyncReport, Syncer};

use crate::commands::{resolve_token, wire_services};
use crate::output::{OutputFormat, Printer};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Account to synchronize (e.g. the Google account email)
    #[arg(long)]
    pub account: String,

    /// OAuth access token (defaults to $VAULTSYNC_TOKEN)
    #[arg(long)]
    pub token: Option<String>,
}

impl SyncCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let printer = Printer::new(format);

        let token = match resolve_token(self.token.as_deref()) {
            Ok(token) => token,
            Err(err) => {
                printer.error(&err.to_string());
                return Ok(());
            }
        };

        let services = wire_services(config, &token).await?;
        let ctx = AccountContext::new(&self.account);

        printer.info("Starting synchronization...");

        match services.engine.perform_sync(&ctx).await {
            Ok(report) => print_report(&printer, &report),
            Err(SyncError::AuthorizationRequired { resume_token }) => {
                printer.error(&format!(
                    "Authorization required; renew consent and retry (resume token: {resume_token})"
                ));
            }
            Err(err) => return Err(err.into()),
        }

        Ok(())
    }
}

pub(crate) fn print_report(printer: &Printer, report: &SyncReport) {
    if printer.is_json() {
        printer.json(&serde_json::json!({
            "downloaded": report.downloaded,
            "uploaded": report.uploaded,
            "deleted_local": report.deleted_local,
            "deleted_remote": report.deleted_remote,
            "errors": report.errors,
            "duration_ms": report.duration_ms,
        }));
        return;
    }

    let duration = if report.duration_ms >= 1000 {
        format!("{:.1}s", report.duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", report.duration_ms)
    };

    if report.is_clean_noop() {
        printer.success("Already up to date");
    } else {
        printer.success(&format!("Sync completed in {duration}"));
    }

    let counts = [
        ("Downloaded", report.downloaded),
        ("Uploaded", report.uploaded),
        ("Deleted locally", report.deleted_local),
        ("Deleted remotely", report.deleted_remote),
    ];
    for (label, count) in counts {
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            printer.info(&format!("{label}: {count} file{plural}"));
        }
    }

    if !report.errors.is_empty() {
        let plural = if report.errors.len() == 1 { "" } else { "s" };
        printer.error(&format!("{} error{plural} occurred:", report.errors.len()));
        for err in &report.errors {
            printer.info(&format!("  - {err}"));
        }
    }
}
