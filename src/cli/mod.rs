//! CLI module for crunch
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// crunch - shrink a video until it fits a size limit
///
/// Re-encodes with ffmpeg at a bitrate derived from the size budget and the
/// source duration, repeating on the previous output until the file fits or
/// stops shrinking.
#[derive(Parser, Debug)]
#[command(name = "crunch")]
#[command(about = "crunch - Compress a video to fit under a file size limit")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./crunch.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format (pretty, compact, json)
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: String,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compress a video to fit the size budget
    Compress(args::CompressArgs),
    /// Show the bitrate plan for a budget without encoding
    Plan(args::PlanArgs),
    /// Show the probed duration and audio bitrate
    Probe(args::ProbeArgs),
}

/// Process exit status of a finished command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Rejected,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
            Outcome::Rejected => 2,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_defaults() {
        let cli = Cli::try_parse_from(["crunch", "compress", "clip.mp4"]).unwrap();
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.log_format, "compact");
        match cli.command {
            Commands::Compress(args) => {
                assert_eq!(args.input, PathBuf::from("clip.mp4"));
                assert_eq!(args.max_size_kb, 6000);
                assert!(!args.single_pass);
                assert!(!args.json);
                assert!(args.max_iterations.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "crunch", "plan", "clip.mp4", "--max-size-kb", "5000", "--log-level", "debug",
            "--config", "alt.toml",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Commands::Plan(ref a) if a.max_size_kb == 5000));
    }

    #[test]
    fn test_budget_must_be_a_number() {
        assert!(Cli::try_parse_from(["crunch", "compress", "clip.mp4", "--max-size-kb", "big"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Success.code(), 0);
        assert_eq!(Outcome::Failure.code(), 1);
        assert_eq!(Outcome::Rejected.code(), 2);
    }
}
