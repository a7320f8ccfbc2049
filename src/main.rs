//! Rotation engines CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rotation_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = setup_logging(cli.log_level.as_str(), cli.json_logs, cli.log_file.as_deref())
        .context("Failed to set up logging")?;

    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &cli.config).await,
        Commands::Engines => cli::commands::engines::run().await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
