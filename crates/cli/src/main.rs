//! Semitia CLI - semitia command

use anyhow::{Context, Result};
use clap::Parser;
use cli_lib::args::Cli;
use cli_lib::config::{FileConfig, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let file = FileConfig::discover(cli.config.as_deref(), &cwd)?;
    let settings = Settings::resolve(&cli, file)?;

    cli_lib::run(settings).await
}
