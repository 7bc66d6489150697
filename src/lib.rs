//! crunch library
//!
//! Size-constrained video compression: probe a file with ffprobe, plan a
//! video/audio bitrate split that fits a size budget, encode with ffmpeg and
//! repeat on the output until it fits or stops shrinking.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{CompressInteractor, CompressSettings};
pub use domain::errors::{DomainError, RejectionReason};
pub use domain::model::{BitratePlan, CompressionResult, MediaProbe, PassMode, SizeBudget};
pub use domain::rules::BitratePlanner;
