//! Configuration CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::cli::commands::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::{ConfigLoader, PROJECT_CONFIG_PATH};

/// Arguments for `phantom config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config subcommand.
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init,
}

/// Effective configuration.
#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct ConfigShowOutput(pub Config);

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.0).unwrap_or_else(|e| format!("# failed to render config: {e}"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Location of a newly written config file.
#[derive(Debug, serde::Serialize)]
pub struct ConfigInitOutput {
    /// Path the file was written to.
    pub path: PathBuf,
}

impl CommandOutput for ConfigInitOutput {
    fn to_human(&self) -> String {
        format!("Wrote default configuration to {}", self.path.display())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a config subcommand.
pub async fn execute(args: ConfigArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = load_config(config_path)?;
            output(&ConfigShowOutput(config), json_mode);
        }
        ConfigCommands::Init => {
            let path = config_path.map_or_else(|| PathBuf::from(PROJECT_CONFIG_PATH), Path::to_path_buf);
            ConfigLoader::write_default(&path).context("Failed to write default configuration")?;
            output(&ConfigInitOutput { path }, json_mode);
        }
    }
    Ok(())
}
