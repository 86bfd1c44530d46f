//! vaultsync CLI - command-line interface for keyring synchronization
//!
//! Provides commands for:
//! - Running a one-off sync pass
//! - Watching for changes on a polling interval
//! - Viewing local sync state
//! - Viewing and validating configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, status::StatusCommand, sync::SyncCommand, watch::WatchCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "vaultsync", version, about = "Keyring file synchronization for Google Drive")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one synchronization pass
    Sync(SyncCommand),
    /// Sync periodically until interrupted
    Watch(WatchCommand),
    /// Show local sync state
    Status(StatusCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let config = commands::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&config, format).await,
        Commands::Watch(cmd) => cmd.execute(&config, format).await,
        Commands::Status(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(cli.config.as_deref(), format).await,
    }
}
