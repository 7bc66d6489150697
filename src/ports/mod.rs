// Ports - Interface definitions (contracts)

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Captured result of a finished external process
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Port for running external programs
#[async_trait]
pub trait ProcessPort: Send + Sync {
    /// Run `program` with `args` to completion, killing it after `timeout`.
    ///
    /// A program that cannot be found yields `DomainError::ToolUnavailable`;
    /// an expired timeout yields `DomainError::Timeout`. A non-zero exit is
    /// not an error at this level.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, DomainError>;
}

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Extract duration and audio bitrate of a media file
    async fn probe(&self, path: &Path) -> Result<MediaProbe, DomainError>;
}

/// Port for encoding with a bitrate plan
#[async_trait]
pub trait EncodePort: Send + Sync {
    /// Run every pass of the attempt; on success the output file exists
    async fn encode(&self, attempt: &EncodeAttempt) -> Result<(), DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if file exists
    async fn file_exists(&self, path: &Path) -> Result<bool, DomainError>;

    /// Get file size in bytes
    async fn file_size(&self, path: &Path) -> Result<u64, DomainError>;

    /// Delete file; a file that is already gone is not an error
    async fn remove_file(&self, path: &Path) -> Result<(), DomainError>;

    /// Create directory (including parent directories)
    async fn create_directory(&self, path: &Path) -> Result<(), DomainError>;
}
