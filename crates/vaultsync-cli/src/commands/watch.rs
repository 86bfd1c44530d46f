//! Watch command - sync periodically until interrupted
//!
//! Runs the scheduler loop: a pass on startup, then one per poll interval,
//! plus an immediate pass on an account's very first launch. Ctrl-C stops
//! the loop after the current pass.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::info;

use vaultsync_core::config::Config;
use vaultsync_core::domain::record::AccountContext;
use vaultsync_core::ports::CursorStore;
use vaultsync_sync::SyncScheduler;

use crate::commands::{resolve_token, wire_services};
use crate::output::{OutputFormat, Printer};

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Account to synchronize (e.g. the Google account email)
    #[arg(long)]
    pub account: String,

    /// OAuth access token (defaults to $VAULTSYNC_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Override the poll interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,
}

impl WatchCommand {
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

        let interval = Duration::from_secs(self.interval.unwrap_or(config.sync.poll_interval));
        let (scheduler, _flag) = SyncScheduler::new(services.engine.clone(), interval);
        let scheduler = Arc::new(scheduler);

        if services.cursors.take_first_launch(&ctx.account).await? {
            info!(account = %ctx.account, "First launch for this account, syncing now");
            scheduler.request_sync();
        }

        printer.success(&format!(
            "Watching account {} (every {}s, Ctrl-C to stop)",
            ctx.account,
            interval.as_secs()
        ));

        let run = {
            let scheduler = scheduler.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { scheduler.run(&ctx).await })
        };

        tokio::signal::ctrl_c().await?;
        printer.info("Stopping after the current pass...");
        scheduler.stop();
        // Wake the loop so it notices the shutdown flag promptly
        scheduler.request_sync();
        run.await?;

        printer.success("Watch stopped");
        Ok(())
    }
}
