//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rotation")]
#[command(author, version, about = "Band/EMA rotation and fixed-period rebalancing engines")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "ROTATION_CONFIG")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    /// Also write JSON logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay price history through an engine
    Backtest(BacktestArgs),
    /// List available engines
    Engines,
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Engine to replay (signal, rebalance)
    #[arg(short, long)]
    pub engine: String,

    /// Directory holding one <SYMBOL>.csv per asset
    #[arg(short, long)]
    pub data: PathBuf,

    /// Initial capital, overriding the configuration
    #[arg(long)]
    pub capital: Option<f64>,

    /// Symbol for the buy-and-hold comparison; defaults to the engine's first asset
    #[arg(long)]
    pub benchmark: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Save the JSON report to file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,

    /// Save indicator lines and trade markers as CSV (writes <stem>_lines.csv and <stem>_markers.csv)
    #[arg(long)]
    pub chart_csv: Option<PathBuf>,
}
