// Domain errors - Failure and rejection types for the domain layer

use serde::Serialize;
use thiserror::Error;

/// Failures that abort a compression request.
///
/// None of these are retried automatically. Each variant maps to a
/// different corrective action on the user's side, so the messages are
/// kept distinct.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainError {
    /// External binary could not be started
    #[error("{tool} is not installed or not on PATH; install ffmpeg (which ships ffprobe) or set its path in the config")]
    ToolUnavailable { tool: String },

    /// Source file does not exist
    #[error("Input file not found: {path}")]
    InputNotFound { path: String },

    /// Probe output could not be interpreted
    #[error("Malformed media metadata: {0}")]
    MalformedMetadata(String),

    /// Encoder exited unsuccessfully
    #[error("Encode pass {pass} failed (exit code {exit_code:?}):\n{stderr}")]
    EncodeFailure {
        pass: u8,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// External process exceeded its time limit
    #[error("{tool} did not finish within {seconds}s and was killed")]
    Timeout { tool: String, seconds: u64 },

    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// File system operation failed
    #[error("File system error: {0}")]
    FsFail(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    /// True when the user has to install or point at a missing tool
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(self, DomainError::ToolUnavailable { .. })
    }
}

/// Normal terminal outcomes where no correctly sized file can be produced.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Total bitrate for the budget is below the encodable floor
    #[error("Budget too small to encode meaningfully: target total bitrate {target_total_bitrate_bps:.0} bps is below {lower_bound_bps:.0} bps")]
    BudgetTooSmall {
        target_total_bitrate_bps: f64,
        lower_bound_bps: f64,
    },

    /// Nothing is left for video once audio is reserved
    #[error("Video bitrate collapses to near zero ({video_bitrate_bps:.0} bps)")]
    VideoBitrateCollapse { video_bitrate_bps: f64 },

    /// Re-encoding did not make the file any smaller
    #[error("Cannot shrink further: attempt {attempt} produced {current_size_bytes} bytes, previous candidate was {previous_size_bytes} bytes")]
    SizeNotReducible {
        attempt: u32,
        previous_size_bytes: u64,
        current_size_bytes: u64,
    },

    /// Still over budget after the configured number of attempts
    #[error("Still over budget after {attempts} attempts (last output {last_size_bytes} bytes)")]
    IterationLimitReached { attempts: u32, last_size_bytes: u64 },
}
