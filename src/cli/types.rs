//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    config::ConfigArgs, fingerprint::FingerprintArgs, noise::NoiseArgs, persona::PersonaArgs,
};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "phantom")]
#[command(about = "Phantom - persona-driven decoy traffic generator", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Load configuration from this file instead of the project config files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the noise scheduler until interrupted
    Run,

    /// Show queue depth and the active persona
    Status,

    /// Consume generated noise events
    Noise(NoiseArgs),

    /// Persona management commands
    Persona(PersonaArgs),

    /// Generate form-fill data matching the active persona
    FormData,

    /// Show the browser fingerprint for now or a given time
    Fingerprint(FingerprintArgs),

    /// Configuration commands
    Config(ConfigArgs),
}
