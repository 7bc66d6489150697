//! crunch CLI
//!
//! Compresses a video until it fits under a file size limit, re-encoding
//! with ffmpeg at a bitrate planned from the budget and the probed duration.
//!
//! # Usage
//!
//! ```bash
//! crunch compress holiday.mov --max-size-kb 8000
//! crunch plan holiday.mov --max-size-kb 8000 --json
//! crunch probe holiday.mov
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crunch_cli::adapters::tracing_log::{init_logging, LogFormat, LogLevel};
use crunch_cli::cli::{commands, Cli, Commands, Outcome};

/// Main entry point for the crunch CLI application
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            Outcome::Failure.into()
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome> {
    let level = LogLevel::parse(&cli.log_level)?;
    let format = LogFormat::parse(&cli.log_format)?;
    init_logging(level, format);

    info!("Starting crunch {}", env!("CARGO_PKG_VERSION"));
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Compress(args) => commands::compress(args, config).await,
        Commands::Plan(args) => commands::plan(args, config).await,
        Commands::Probe(args) => commands::probe(args, config).await,
    }
}
