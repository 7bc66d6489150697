//! Command implementations

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::adapters::{CrunchConfig, TomlConfigAdapter};
use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::args::{CompressArgs, PlanArgs, ProbeArgs};
use crate::cli::Outcome;
use crate::domain::errors::RejectionReason;
use crate::domain::model::{BitratePlan, CompressionResult, MediaProbe, PassMode, SizeBudget};
use crate::utils::{format_duration, format_file_size};

/// Machine-readable summary of a compress run
#[derive(Debug, Serialize)]
struct CompressReport<'a> {
    generated_at: DateTime<Utc>,
    input: &'a Path,
    max_size_kb: u64,
    pass_mode: PassMode,
    result: &'a CompressionResult,
}

#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    generated_at: DateTime<Utc>,
    input: &'a Path,
    budget: SizeBudget,
    probe: &'a MediaProbe,
    plan: Option<&'a BitratePlan>,
    rejection: Option<&'a RejectionReason>,
}

#[derive(Debug, Serialize)]
struct ProbeReport<'a> {
    generated_at: DateTime<Utc>,
    input: &'a Path,
    probe: &'a MediaProbe,
}

/// Effective configuration before command-line overrides
pub fn load_config(explicit: Option<&Path>) -> Result<CrunchConfig> {
    TomlConfigAdapter::load(explicit).context("Failed to load configuration")
}

fn container(config: &CrunchConfig) -> Result<DefaultAppContainer> {
    DefaultAppContainer::new(config).context("Invalid configuration")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize report")?
    );
    Ok(())
}

/// Execute the compress command
pub async fn compress(args: CompressArgs, mut config: CrunchConfig) -> Result<Outcome> {
    if let Some(dir) = args.output_dir.clone() {
        config.output_dir = Some(dir);
    }
    if let Some(prefix) = args.prefix.clone() {
        config.filename_prefix = prefix;
    }
    if let Some(max) = args.max_iterations {
        config.max_iterations = max;
    }
    if args.keep_intermediates {
        config.keep_intermediates = true;
    }

    let interactor = container(&config)?.compress_interactor();
    let two_pass = !args.single_pass;

    info!("Input: {}", args.input.display());
    let result = interactor.compress(&args.input, args.max_size_kb, two_pass).await;

    if args.json {
        print_json(&CompressReport {
            generated_at: Utc::now(),
            input: &args.input,
            max_size_kb: args.max_size_kb,
            pass_mode: PassMode::from_two_pass(two_pass),
            result: &result,
        })?;
    }

    match result {
        CompressionResult::Success {
            output_path,
            final_size_bytes,
            attempts,
            ..
        } => {
            if !args.json {
                println!("{}", output_path.display());
                eprintln!(
                    "Compressed to {} in {} attempt(s)",
                    format_file_size(final_size_bytes),
                    attempts
                );
            }
            Ok(Outcome::Success)
        }
        CompressionResult::Rejected { reason } => {
            if !args.json {
                eprintln!("Rejected: {}", reason);
            }
            Ok(Outcome::Rejected)
        }
        CompressionResult::Failed { cause } => {
            if args.json {
                error!("{}", cause);
                Ok(Outcome::Failure)
            } else {
                Err(anyhow::Error::new(cause)
                    .context(format!("Failed to compress {}", args.input.display())))
            }
        }
    }
}

/// Execute the plan command
pub async fn plan(args: PlanArgs, config: CrunchConfig) -> Result<Outcome> {
    let interactor = container(&config)?.compress_interactor();
    let preview = interactor
        .preview(&args.input, args.max_size_kb)
        .await
        .with_context(|| format!("Failed to plan {}", args.input.display()))?;

    if args.json {
        print_json(&PlanReport {
            generated_at: Utc::now(),
            input: &args.input,
            budget: preview.budget,
            probe: &preview.probe,
            plan: preview.plan.as_ref().ok(),
            rejection: preview.plan.as_ref().err(),
        })?;
    } else {
        print_probe(&preview.probe);
        println!("Budget:         {}", preview.budget);
        match &preview.plan {
            Ok(plan) => {
                println!("Target total:   {:.0} bps", plan.target_total_bitrate_bps);
                println!("Video bitrate:  {} bps", plan.video_bps());
                println!("Audio bitrate:  {} bps", plan.audio_bps());
                if let Some(advisory) = &plan.advisory {
                    println!(
                        "Advisory:       quality will suffer below {} KB",
                        advisory.recommended_min_kilobytes
                    );
                }
            }
            Err(reason) => println!("Rejected:       {}", reason),
        }
    }

    Ok(match preview.plan {
        Ok(_) => Outcome::Success,
        Err(_) => Outcome::Rejected,
    })
}

/// Execute the probe command
pub async fn probe(args: ProbeArgs, config: CrunchConfig) -> Result<Outcome> {
    let interactor = container(&config)?.compress_interactor();
    let probe = interactor
        .inspect(&args.input)
        .await
        .with_context(|| format!("Failed to probe {}", args.input.display()))?;

    if args.json {
        print_json(&ProbeReport {
            generated_at: Utc::now(),
            input: &args.input,
            probe: &probe,
        })?;
    } else {
        print_probe(&probe);
    }
    Ok(Outcome::Success)
}

/// Clock-style duration, or raw seconds when the value does not fit a `Duration`
fn describe_duration(seconds: f64) -> String {
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) => format!("{} ({:.3} s)", format_duration(duration), seconds),
        Err(_) => format!("{} s", seconds),
    }
}

fn print_probe(probe: &MediaProbe) {
    println!("Duration:       {}", describe_duration(probe.duration_seconds));
    if probe.has_audio {
        println!("Audio bitrate:  {:.0} bps", probe.audio_bitrate_bps);
    } else {
        println!("Audio:          none");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_compress_report_shape() {
        let result = CompressionResult::success(PathBuf::from("/v/clipcrunch_.mp4"), 2048, 1);
        let report = CompressReport {
            generated_at: Utc::now(),
            input: Path::new("/v/clip.mp4"),
            max_size_kb: 6000,
            pass_mode: PassMode::Two,
            result: &result,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["pass_mode"], "two");
        assert_eq!(value["result"]["status"], "success");
        assert_eq!(value["result"]["final_size_kb"], 2);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_describe_duration() {
        assert_eq!(describe_duration(90.5), "01:30.500 (90.500 s)");
        assert_eq!(describe_duration(1e20), "100000000000000000000 s");
    }

    #[test]
    fn test_rejection_report_carries_reason() {
        let result = CompressionResult::Rejected {
            reason: RejectionReason::IterationLimitReached {
                attempts: 5,
                last_size_bytes: 9000,
            },
        };
        let report = CompressReport {
            generated_at: Utc::now(),
            input: Path::new("clip.mp4"),
            max_size_kb: 1,
            pass_mode: PassMode::Single,
            result: &result,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["result"]["status"], "rejected");
        assert_eq!(value["result"]["reason"]["kind"], "iteration_limit_reached");
    }

    #[tokio::test]
    async fn test_compress_reports_missing_tool() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("clip.mp4");
        std::fs::write(&input, b"not really a video").unwrap();

        let mut config = CrunchConfig::default();
        config.ffprobe_path = dir.path().join("no-ffprobe").display().to_string();

        let args = CompressArgs {
            input,
            max_size_kb: 100,
            single_pass: false,
            output_dir: None,
            prefix: None,
            max_iterations: None,
            keep_intermediates: false,
            json: false,
        };
        let err = compress(args, config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("not installed"));
    }
}
