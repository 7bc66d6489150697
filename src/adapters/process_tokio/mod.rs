// Tokio process adapter - Runs external tools with a hard timeout

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

/// Process runner backed by `tokio::process`
#[derive(Debug, Default, Clone)]
pub struct TokioProcessAdapter;

impl TokioProcessAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Short tool name used in error messages ("ffmpeg" for "/usr/bin/ffmpeg")
    fn tool_name(program: &str) -> String {
        Path::new(program)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| program.to_string())
    }
}

#[async_trait]
impl ProcessPort for TokioProcessAdapter {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, DomainError> {
        debug!("Running: {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => DomainError::ToolUnavailable {
                    tool: Self::tool_name(program),
                },
                _ => DomainError::FsFail(format!("Failed to start {}: {}", program, e)),
            })?;

        // Dropping the child on timeout kills it
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| DomainError::Timeout {
                tool: Self::tool_name(program),
                seconds: timeout.as_secs(),
            })?
            .map_err(|e| DomainError::FsFail(format!("Failed to wait for {}: {}", program, e)))?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
