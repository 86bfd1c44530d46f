//! Config command - view and validate configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use vaultsync_core::config::Config;

use crate::output::{OutputFormat, Printer};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: Option<&str>, format: OutputFormat) -> Result<()> {
        let printer = Printer::new(format);
        let path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_path);

        match self {
            ConfigCommand::Show => {
                let config = Config::load_or_default(&path);
                if printer.is_json() {
                    let json = serde_json::to_value(&config)
                        .context("Failed to serialize configuration")?;
                    printer.json(&json);
                } else {
                    printer.success(&format!("Configuration ({})", path.display()));
                    let yaml = serde_yaml::to_string(&config)
                        .context("Failed to serialize configuration")?;
                    for line in yaml.lines() {
                        printer.info(line);
                    }
                }
            }

            ConfigCommand::Path => {
                if printer.is_json() {
                    printer.json(&serde_json::json!({"path": path}));
                } else {
                    println!("{}", path.display());
                }
            }

            ConfigCommand::Validate => {
                let config = Config::load_or_default(&path);
                let errors = config.validate();
                if errors.is_empty() {
                    printer.success("Configuration is valid");
                } else if printer.is_json() {
                    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                    printer.json(&serde_json::json!({"valid": false, "errors": messages}));
                } else {
                    printer.error(&format!("{} problem(s) found:", errors.len()));
                    for err in &errors {
                        printer.info(&format!("  - {err}"));
                    }
                }
            }
        }

        Ok(())
    }
}
