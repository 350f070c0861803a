//! Phantom CLI entry point.

use clap::Parser;

use phantom::cli::commands;
use phantom::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run => commands::run::execute(config, cli.json).await,
        Commands::Status => commands::status::execute(config, cli.json).await,
        Commands::Noise(args) => commands::noise::execute(args, config, cli.json).await,
        Commands::Persona(args) => commands::persona::execute(args, config, cli.json).await,
        Commands::FormData => commands::form_data::execute(config, cli.json).await,
        Commands::Fingerprint(args) => commands::fingerprint::execute(args, config, cli.json).await,
        Commands::Config(args) => commands::config::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        phantom::cli::handle_error(err, cli.json);
    }
}
