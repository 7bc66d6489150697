// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::errors::{DomainError, RejectionReason};

/// Facts about a candidate file that the planner needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaProbe {
    /// Container duration in seconds, always positive
    pub duration_seconds: f64,
    /// Bitrate of the first audio stream; 0 when absent or unknown
    pub audio_bitrate_bps: f64,
    /// Whether the file carries any audio stream at all
    pub has_audio: bool,
}

impl MediaProbe {
    /// Create a probe result, rejecting durations that cannot be planned against
    pub fn new(
        duration_seconds: f64,
        audio_bitrate_bps: f64,
        has_audio: bool,
    ) -> Result<Self, DomainError> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(DomainError::MalformedMetadata(format!(
                "duration must be a positive number of seconds, got {}",
                duration_seconds
            )));
        }
        if !audio_bitrate_bps.is_finite() || audio_bitrate_bps < 0.0 {
            return Err(DomainError::MalformedMetadata(format!(
                "audio bitrate must be non-negative, got {}",
                audio_bitrate_bps
            )));
        }

        Ok(Self {
            duration_seconds,
            audio_bitrate_bps,
            has_audio,
        })
    }

    /// Probe of a file with no audio stream
    pub fn video_only(duration_seconds: f64) -> Result<Self, DomainError> {
        Self::new(duration_seconds, 0.0, false)
    }
}

/// Maximum acceptable output size, in kilobytes (1 KB = 1024 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeBudget {
    pub upper_bound_kilobytes: u64,
}

impl SizeBudget {
    /// Create a size budget; zero is rejected
    pub fn new(upper_bound_kilobytes: u64) -> Result<Self, DomainError> {
        if upper_bound_kilobytes == 0 {
            return Err(DomainError::BadArgs(
                "Size budget must be at least 1 KB".to_string(),
            ));
        }
        Ok(Self {
            upper_bound_kilobytes,
        })
    }

    /// Budget in bytes
    pub fn bytes(&self) -> u64 {
        self.upper_bound_kilobytes.saturating_mul(1024)
    }

    /// Whether a file of the given size fits
    pub fn admits(&self, size_bytes: u64) -> bool {
        size_bytes <= self.bytes()
    }
}

impl fmt::Display for SizeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} KB", self.upper_bound_kilobytes)
    }
}

/// Non-fatal warning that the budget is below the size needed for decent quality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAdvisory {
    pub recommended_min_kilobytes: u64,
}

/// Video/audio split of the total bitrate a budget allows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BitratePlan {
    pub video_bitrate_bps: f64,
    pub audio_bitrate_bps: f64,
    pub target_total_bitrate_bps: f64,
    pub advisory: Option<QualityAdvisory>,
}

impl BitratePlan {
    /// Video bitrate as whole bits per second, the form the encoder takes
    pub fn video_bps(&self) -> u64 {
        self.video_bitrate_bps.round() as u64
    }

    /// Audio bitrate as whole bits per second
    pub fn audio_bps(&self) -> u64 {
        self.audio_bitrate_bps.round() as u64
    }
}

/// Number of encoder passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassMode {
    /// One encode straight to the output
    Single,
    /// Statistics pass to a discard sink, then the real encode
    Two,
}

impl PassMode {
    pub fn from_two_pass(two_pass: bool) -> Self {
        if two_pass {
            PassMode::Two
        } else {
            PassMode::Single
        }
    }

    pub fn pass_count(&self) -> u8 {
        match self {
            PassMode::Single => 1,
            PassMode::Two => 2,
        }
    }
}

/// One invocation of the encode executor
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeAttempt {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub plan: BitratePlan,
    /// Whether the input has an audio stream to encode
    pub has_audio: bool,
    pub pass_mode: PassMode,
    /// Per-attempt pass-log prefix so concurrent jobs never share statistics
    pub passlog_prefix: PathBuf,
}

impl EncodeAttempt {
    /// Files the encoder writes for a given pass-log prefix
    pub fn passlog_files(&self) -> Vec<PathBuf> {
        let base = self.passlog_prefix.to_string_lossy();
        vec![
            PathBuf::from(format!("{}-0.log", base)),
            PathBuf::from(format!("{}-0.log.mbtree", base)),
            // Renamed to the names above only when a pass finishes cleanly
            PathBuf::from(format!("{}-0.log.temp", base)),
            PathBuf::from(format!("{}-0.log.mbtree.temp", base)),
        ]
    }
}

/// Terminal value of a compression request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompressionResult {
    Success {
        output_path: PathBuf,
        final_size_bytes: u64,
        final_size_kb: u64,
        attempts: u32,
    },
    Rejected {
        reason: RejectionReason,
    },
    Failed {
        cause: DomainError,
    },
}

impl CompressionResult {
    pub fn success(output_path: PathBuf, final_size_bytes: u64, attempts: u32) -> Self {
        CompressionResult::Success {
            output_path,
            final_size_bytes,
            final_size_kb: final_size_bytes.div_ceil(1024),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompressionResult::Success { .. })
    }

    /// Path of the produced file, if any
    pub fn output_path(&self) -> Option<&PathBuf> {
        match self {
            CompressionResult::Success { output_path, .. } => Some(output_path),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionResult::Success {
                output_path,
                final_size_kb,
                attempts,
                ..
            } => write!(
                f,
                "Compressed to {} ({} KB) in {} attempt(s)",
                output_path.display(),
                final_size_kb,
                attempts
            ),
            CompressionResult::Rejected { reason } => write!(f, "Rejected: {}", reason),
            CompressionResult::Failed { cause } => write!(f, "Failed: {}", cause),
        }
    }
}

#[cfg(test)]
mod tests;
