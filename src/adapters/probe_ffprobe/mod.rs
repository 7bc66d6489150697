//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` with JSON output through the process port and extracts the
//! two facts the bitrate planner needs: container duration and the bitrate
//! of the first audio stream.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Subset of `ffprobe -show_format -show_streams -of json`
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    bit_rate: Option<Value>,
}

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    process: Arc<dyn ProcessPort>,
    ffprobe_path: String,
    timeout: Duration,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(
        process: Arc<dyn ProcessPort>,
        ffprobe_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            process,
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            "-of".to_string(),
            "json".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Interpret ffprobe's JSON document
    pub fn parse_probe_json(json: &str) -> Result<MediaProbe, DomainError> {
        let output: FfprobeOutput = serde_json::from_str(json)
            .map_err(|e| DomainError::MalformedMetadata(format!("invalid ffprobe JSON: {}", e)))?;

        let duration = output
            .format
            .as_ref()
            .and_then(|format| format.duration.as_ref())
            .and_then(number_of)
            .ok_or_else(|| {
                DomainError::MalformedMetadata("format.duration is missing or not a number".to_string())
            })?;

        let audio_stream = output
            .streams
            .iter()
            .find(|stream| stream.codec_type.as_deref() == Some("audio"));

        let audio_bitrate = audio_stream
            .and_then(|stream| stream.bit_rate.as_ref())
            .and_then(number_of)
            .filter(|rate| rate.is_finite() && *rate >= 0.0)
            .unwrap_or(0.0);

        MediaProbe::new(duration, audio_bitrate, audio_stream.is_some())
    }
}

/// ffprobe prints numbers as strings; accept either form
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<MediaProbe, DomainError> {
        let exists = tokio::fs::try_exists(path).await.map_err(|e| {
            DomainError::FsFail(format!("Failed to check {}: {}", path.display(), e))
        })?;
        if !exists {
            return Err(DomainError::InputNotFound {
                path: path.display().to_string(),
            });
        }

        let output = self
            .process
            .run(&self.ffprobe_path, &Self::probe_args(path), self.timeout)
            .await?;

        if !output.success() {
            return Err(DomainError::MalformedMetadata(format!(
                "ffprobe exited with {:?}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        let probe = Self::parse_probe_json(&output.stdout)?;
        debug!("ffprobe JSON for {}: {}", path.display(), output.stdout);
        info!(
            "Probed {}: duration {:.3}s, audio {:.0} bps",
            path.display(),
            probe.duration_seconds,
            probe.audio_bitrate_bps
        );
        Ok(probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Returns a canned output and records the invocation
    struct CannedProcess {
        output: Result<ProcessOutput, DomainError>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl CannedProcess {
        fn new(output: Result<ProcessOutput, DomainError>) -> Arc<Self> {
            Arc::new(Self {
                output,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ProcessPort for CannedProcess {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _timeout: Duration,
        ) -> Result<ProcessOutput, DomainError> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            self.output.clone()
        }
    }

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "bit_rate": "2000000"},
            {"index": 1, "codec_type": "audio", "bit_rate": "128000"},
            {"index": 2, "codec_type": "audio", "bit_rate": "64000"}
        ],
        "format": {"filename": "in.mp4", "duration": "120.500000"}
    }"#;

    fn ok_output(stdout: &str) -> Result<ProcessOutput, DomainError> {
        Ok(ProcessOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    #[test]
    fn test_parse_uses_first_audio_stream() {
        let probe = FFprobeAdapter::parse_probe_json(SAMPLE).unwrap();
        assert_eq!(probe.duration_seconds, 120.5);
        assert_eq!(probe.audio_bitrate_bps, 128_000.0);
        assert!(probe.has_audio);
    }

    #[test]
    fn test_parse_without_audio_stream() {
        let json = r#"{"streams": [{"codec_type": "video"}], "format": {"duration": "10"}}"#;
        let probe = FFprobeAdapter::parse_probe_json(json).unwrap();
        assert_eq!(probe.audio_bitrate_bps, 0.0);
        assert!(!probe.has_audio);
    }

    #[test]
    fn test_parse_audio_without_bit_rate_defaults_to_zero() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": 10.0}}"#;
        let probe = FFprobeAdapter::parse_probe_json(json).unwrap();
        assert_eq!(probe.audio_bitrate_bps, 0.0);
        assert!(probe.has_audio);

        let json = r#"{"streams": [{"codec_type": "audio", "bit_rate": "N/A"}], "format": {"duration": "10"}}"#;
        let probe = FFprobeAdapter::parse_probe_json(json).unwrap();
        assert_eq!(probe.audio_bitrate_bps, 0.0);
    }

    #[test]
    fn test_parse_rejects_bad_duration() {
        for json in [
            r#"{"streams": [], "format": {}}"#,
            r#"{"streams": [], "format": {"duration": "N/A"}}"#,
            r#"{"streams": [], "format": {"duration": "0.0"}}"#,
            r#"{"streams": []}"#,
            "not json",
        ] {
            assert!(
                matches!(
                    FFprobeAdapter::parse_probe_json(json),
                    Err(DomainError::MalformedMetadata(_))
                ),
                "accepted {}",
                json
            );
        }
    }

    #[tokio::test]
    async fn test_probe_missing_input() {
        let dir = TempDir::new().unwrap();
        let process = CannedProcess::new(ok_output(SAMPLE));
        let adapter = FFprobeAdapter::new(process.clone(), "ffprobe", Duration::from_secs(5));

        let err = adapter.probe(&dir.path().join("gone.mp4")).await.unwrap_err();
        assert!(matches!(err, DomainError::InputNotFound { .. }));
        assert!(process.calls.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_unreadable_location_is_fs_failure() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"not a directory").unwrap();
        let process = CannedProcess::new(ok_output(SAMPLE));
        let adapter = FFprobeAdapter::new(process.clone(), "ffprobe", Duration::from_secs(5));

        // Looking inside a regular file fails with ENOTDIR rather than NotFound
        let err = adapter.probe(&file.join("clip.mp4")).await.unwrap_err();
        assert!(matches!(err, DomainError::FsFail(_)), "got {:?}", err);
        assert!(process.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe_invokes_ffprobe_with_json_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"data").unwrap();

        let process = CannedProcess::new(ok_output(SAMPLE));
        let adapter =
            FFprobeAdapter::new(process.clone(), "/opt/ffmpeg/ffprobe", Duration::from_secs(5));
        let probe = adapter.probe(&input).await.unwrap();
        assert_eq!(probe.duration_seconds, 120.5);

        let calls = process.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/opt/ffmpeg/ffprobe");
        assert!(calls[0].1.windows(2).any(|w| w[0] == "-of" && w[1] == "json"));
        assert_eq!(calls[0].1.last().unwrap(), &input.to_string_lossy().to_string());
    }

    #[tokio::test]
    async fn test_probe_surfaces_tool_unavailable() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"data").unwrap();

        let process = CannedProcess::new(Err(DomainError::ToolUnavailable {
            tool: "ffprobe".to_string(),
        }));
        let adapter = FFprobeAdapter::new(process, "ffprobe", Duration::from_secs(5));
        let err = adapter.probe(&input).await.unwrap_err();
        assert!(err.is_tool_unavailable());
    }

    #[tokio::test]
    async fn test_probe_nonzero_exit_is_malformed_metadata() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"data").unwrap();

        let process = CannedProcess::new(Ok(ProcessOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "in.mp4: Invalid data found when processing input".to_string(),
        }));
        let adapter = FFprobeAdapter::new(process, "ffprobe", Duration::from_secs(5));
        match adapter.probe(&input).await.unwrap_err() {
            DomainError::MalformedMetadata(message) => {
                assert!(message.contains("Invalid data found"))
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
