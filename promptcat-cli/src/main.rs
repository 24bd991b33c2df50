//! promptcat - inspect, validate and render template catalogs

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use promptcat_core::config::PromptcatConfig;

mod catalog_cli;

use catalog_cli::CatalogCommand;

/// Default config file, read when present
const DEFAULT_CONFIG_FILE: &str = "promptcat.yaml";

/// Log levels
#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "promptcat",
    about = "Inspect, validate and render template catalogs",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: CatalogCommand,

    /// Configuration file (defaults to ./promptcat.yaml when present)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Shorthand for --log-level debug
    #[clap(long, global = true)]
    debug: bool,
}

fn initialize_tracing(log_level: &LogLevel, debug: bool) {
    let directive = if debug {
        LogLevel::Debug.to_filter_directive()
    } else {
        log_level.to_filter_directive()
    };

    // RUST_LOG wins over the flags when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries command output
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<PromptcatConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            PromptcatConfig::load_from_path(path)
        }
        None => PromptcatConfig::load_from_path(DEFAULT_CONFIG_FILE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level, cli.debug);

    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;
    debug!("Effective configuration: {:?}", config);

    cli.command.execute(&config).await
}
