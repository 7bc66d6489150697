//! FFmpeg execution adapter
//!
//! Drives `ffmpeg` through the process port to encode at a planned bitrate,
//! either in a single pass or as a statistics pass followed by the real
//! encode.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Output for the statistics-only first pass
pub fn discard_sink() -> &'static str {
    if Path::new("/dev/null").exists() {
        "/dev/null"
    } else {
        "NUL"
    }
}

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    process: Arc<dyn ProcessPort>,
    ffmpeg_path: String,
    video_codec: String,
    audio_codec: String,
    timeout: Duration,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter encoding H.264 video and AAC audio
    pub fn new(process: Arc<dyn ProcessPort>, ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            process,
            ffmpeg_path: ffmpeg_path.into(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            timeout,
        }
    }

    /// Set the encoder names passed to `-c:v` and `-c:a`
    pub fn with_codecs(mut self, video_codec: impl Into<String>, audio_codec: impl Into<String>) -> Self {
        self.video_codec = video_codec.into();
        self.audio_codec = audio_codec.into();
        self
    }

    fn input_and_video_args(&self, attempt: &EncodeAttempt) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            // Progress lines would otherwise pile up in the captured stderr
            "-nostats".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            attempt.input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-b:v".to_string(),
            attempt.plan.video_bps().to_string(),
        ]
    }

    fn pass_args(pass: u8, attempt: &EncodeAttempt) -> Vec<String> {
        vec![
            "-pass".to_string(),
            pass.to_string(),
            "-passlogfile".to_string(),
            attempt.passlog_prefix.to_string_lossy().to_string(),
        ]
    }

    fn audio_args(&self, attempt: &EncodeAttempt) -> Vec<String> {
        if !attempt.has_audio {
            return vec!["-an".to_string()];
        }

        let mut args = vec!["-c:a".to_string(), self.audio_codec.clone()];
        // Unknown source bitrate: leave the encoder default in place
        let audio_bps = attempt.plan.audio_bps();
        if audio_bps > 0 {
            args.push("-b:a".to_string());
            args.push(audio_bps.to_string());
        }
        args
    }

    /// Arguments for the statistics pass
    pub fn first_pass_args(&self, attempt: &EncodeAttempt) -> Vec<String> {
        let mut args = self.input_and_video_args(attempt);
        args.extend(Self::pass_args(1, attempt));
        args.extend([
            "-an".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            discard_sink().to_string(),
        ]);
        args
    }

    /// Arguments for the final pass of a two-pass encode
    pub fn second_pass_args(&self, attempt: &EncodeAttempt) -> Vec<String> {
        let mut args = self.input_and_video_args(attempt);
        args.extend(Self::pass_args(2, attempt));
        args.extend(self.audio_args(attempt));
        args.push(attempt.output_path.to_string_lossy().to_string());
        args
    }

    /// Arguments for a one-shot encode
    pub fn single_pass_args(&self, attempt: &EncodeAttempt) -> Vec<String> {
        let mut args = self.input_and_video_args(attempt);
        args.extend(self.audio_args(attempt));
        args.push(attempt.output_path.to_string_lossy().to_string());
        args
    }

    async fn run_pass(&self, pass: u8, args: Vec<String>) -> Result<(), DomainError> {
        let started = Instant::now();
        let output = self.process.run(&self.ffmpeg_path, &args, self.timeout).await?;

        if !output.success() {
            return Err(DomainError::EncodeFailure {
                pass,
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        info!("Pass {} finished in {:.2}s", pass, started.elapsed().as_secs_f64());
        Ok(())
    }

    async fn run_passes(&self, attempt: &EncodeAttempt) -> Result<u8, DomainError> {
        match attempt.pass_mode {
            PassMode::Two => {
                self.run_pass(1, self.first_pass_args(attempt)).await?;
                self.run_pass(2, self.second_pass_args(attempt)).await?;
                Ok(2)
            }
            PassMode::Single => {
                self.run_pass(1, self.single_pass_args(attempt)).await?;
                Ok(1)
            }
        }
    }

    async fn remove_passlogs(attempt: &EncodeAttempt) {
        for file in attempt.passlog_files() {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove pass-log {}: {}", file.display(), e),
            }
        }
    }
}

#[async_trait]
impl EncodePort for FFmpegAdapter {
    async fn encode(&self, attempt: &EncodeAttempt) -> Result<(), DomainError> {
        info!(
            "Encoding {} -> {} ({} pass, video {} bps, audio {} bps)",
            attempt.input_path.display(),
            attempt.output_path.display(),
            attempt.pass_mode.pass_count(),
            attempt.plan.video_bps(),
            attempt.plan.audio_bps()
        );

        let result = self.run_passes(attempt).await;
        if attempt.pass_mode == PassMode::Two {
            Self::remove_passlogs(attempt).await;
        }
        let last_pass = result?;

        let written = tokio::fs::try_exists(&attempt.output_path)
            .await
            .unwrap_or(false);
        if !written {
            return Err(DomainError::EncodeFailure {
                pass: last_pass,
                exit_code: Some(0),
                stderr: format!(
                    "encoder reported success but {} was not written",
                    attempt.output_path.display()
                ),
            });
        }

        Ok(())
    }
}
