//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Budget used when none is given, in kilobytes
pub const DEFAULT_MAX_SIZE_KB: u64 = 6000;

/// Arguments for the compress command
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Input video file path
    pub input: PathBuf,

    /// Size limit for the output, in kilobytes (1 KB = 1024 bytes)
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE_KB)]
    pub max_size_kb: u64,

    /// Encode in one pass instead of two
    #[arg(long)]
    pub single_pass: bool,

    /// Directory for the output file (default: next to the input)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Text inserted between the input's name and the extension
    #[arg(long)]
    pub prefix: Option<String>,

    /// Encode attempts before giving up
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Keep superseded intermediate files
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input video file path
    pub input: PathBuf,

    /// Size limit for the output, in kilobytes
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE_KB)]
    pub max_size_kb: u64,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file path
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
