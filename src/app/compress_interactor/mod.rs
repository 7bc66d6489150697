// Compress interactor - Orchestrates probe, plan, encode and size evaluation

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::toml_config::CrunchConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::BitratePlanner;
use crate::ports::*;
use crate::utils::format_file_size;
use crate::utils::path::{derive_output_path, passlog_prefix};

/// Naming, placement and iteration policy for the controller
#[derive(Debug, Clone, PartialEq)]
pub struct CompressSettings {
    pub filename_prefix: String,
    pub output_extension: String,
    pub max_iterations: u32,
    pub output_dir: Option<PathBuf>,
    pub passlog_dir: Option<PathBuf>,
    /// Disables every deletion the controller would otherwise perform
    pub keep_intermediates: bool,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self::from(&CrunchConfig::default())
    }
}

impl From<&CrunchConfig> for CompressSettings {
    fn from(config: &CrunchConfig) -> Self {
        Self {
            filename_prefix: config.filename_prefix.clone(),
            output_extension: config.output_extension.clone(),
            max_iterations: config.max_iterations,
            output_dir: config.output_dir.clone(),
            passlog_dir: config.passlog_dir.clone(),
            keep_intermediates: config.keep_intermediates,
        }
    }
}

/// Probe plus the planner's verdict, without encoding anything
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPreview {
    pub probe: MediaProbe,
    pub budget: SizeBudget,
    pub plan: Result<BitratePlan, RejectionReason>,
}

/// Output paths and pass-log prefixes owned by in-flight requests
#[derive(Debug, Default)]
struct PathClaims {
    held: Mutex<HashSet<PathBuf>>,
}

impl PathClaims {
    fn claim(&self, paths: &[&Path]) -> bool {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if paths.iter().any(|p| held.contains(*p)) {
            return false;
        }
        held.extend(paths.iter().map(|p| p.to_path_buf()));
        true
    }

    fn release(&self, paths: &[PathBuf]) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        for path in paths {
            held.remove(path);
        }
    }
}

/// Claims taken by one request; released when the request ends or is dropped
struct ClaimGuard<'a> {
    claims: &'a PathClaims,
    taken: Vec<PathBuf>,
}

impl<'a> ClaimGuard<'a> {
    fn new(claims: &'a PathClaims) -> Self {
        Self {
            claims,
            taken: Vec::new(),
        }
    }

    fn claim(&mut self, paths: &[&Path]) -> bool {
        if !self.claims.claim(paths) {
            return false;
        }
        self.taken.extend(paths.iter().map(|p| p.to_path_buf()));
        true
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.claims.release(&self.taken);
    }
}

/// Interactor for the size-constrained compression use case
pub struct CompressInteractor {
    probe_port: Arc<dyn ProbePort>,
    encode_port: Arc<dyn EncodePort>,
    fs_port: Arc<dyn FsPort>,
    settings: CompressSettings,
    claims: PathClaims,
}

impl CompressInteractor {
    /// Create new compress interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        encode_port: Arc<dyn EncodePort>,
        fs_port: Arc<dyn FsPort>,
        settings: CompressSettings,
    ) -> Self {
        Self {
            probe_port,
            encode_port,
            fs_port,
            settings,
            claims: PathClaims::default(),
        }
    }

    pub fn settings(&self) -> &CompressSettings {
        &self.settings
    }

    /// Probe a file
    pub async fn inspect(&self, path: &Path) -> Result<MediaProbe, DomainError> {
        self.probe_port.probe(path).await
    }

    /// Probe a file and plan its bitrates for a budget
    pub async fn preview(&self, path: &Path, size_upper_bound_kb: u64) -> Result<PlanPreview, DomainError> {
        let budget = SizeBudget::new(size_upper_bound_kb)?;
        let probe = self.probe_port.probe(path).await?;
        let plan = BitratePlanner::plan(&probe, &budget);
        Ok(PlanPreview { probe, budget, plan })
    }

    /// Re-encode `video_path` until the output fits `size_upper_bound_kb`.
    ///
    /// Every file created along the way is removed again unless it is the
    /// returned output (or `keep_intermediates` is set). The source file is
    /// never modified. A request whose output or pass-log name is held by
    /// another in-flight request on this interactor fails with `BadArgs`.
    pub async fn compress(
        &self,
        video_path: &Path,
        size_upper_bound_kb: u64,
        two_pass: bool,
    ) -> CompressionResult {
        let budget = match SizeBudget::new(size_upper_bound_kb) {
            Ok(budget) => budget,
            Err(cause) => return CompressionResult::Failed { cause },
        };

        info!(
            "Compressing {} to at most {} ({} pass)",
            video_path.display(),
            budget,
            PassMode::from_two_pass(two_pass).pass_count()
        );

        let mut produced = Vec::new();
        let mut claims = ClaimGuard::new(&self.claims);
        let result = self
            .run_attempts(
                video_path,
                budget,
                PassMode::from_two_pass(two_pass),
                &mut produced,
                &mut claims,
            )
            .await;

        self.cleanup(&produced, result.output_path()).await;
        drop(claims);

        match &result {
            CompressionResult::Success { .. } => info!("{}", result),
            CompressionResult::Rejected { reason } => warn!("Compression rejected: {}", reason),
            CompressionResult::Failed { cause } => warn!("Compression failed: {}", cause),
        }
        result
    }

    async fn run_attempts(
        &self,
        source: &Path,
        budget: SizeBudget,
        pass_mode: PassMode,
        produced: &mut Vec<PathBuf>,
        claims: &mut ClaimGuard<'_>,
    ) -> CompressionResult {
        match self.fs_port.file_exists(source).await {
            Ok(true) => {}
            Ok(false) => {
                return CompressionResult::Failed {
                    cause: DomainError::InputNotFound {
                        path: source.display().to_string(),
                    },
                }
            }
            Err(cause) => return CompressionResult::Failed { cause },
        }
        let mut previous_size = match self.fs_port.file_size(source).await {
            Ok(size) => size,
            Err(cause) => return CompressionResult::Failed { cause },
        };

        if let Err(cause) = self.prepare_directories().await {
            return CompressionResult::Failed { cause };
        }

        let mut candidate = source.to_path_buf();
        for attempt in 1..=self.settings.max_iterations {
            let probe = match self.probe_port.probe(&candidate).await {
                Ok(probe) => probe,
                Err(cause) => return CompressionResult::Failed { cause },
            };

            let plan = match BitratePlanner::plan(&probe, &budget) {
                Ok(plan) => plan,
                Err(reason) => return CompressionResult::Rejected { reason },
            };
            if let Some(advisory) = &plan.advisory {
                warn!(
                    "Quality will be degraded; recommended minimum size is {} KB",
                    advisory.recommended_min_kilobytes
                );
            }
            info!(
                "Attempt {}: target {:.0} bps (video {:.0} bps, audio {:.0} bps)",
                attempt, plan.target_total_bitrate_bps, plan.video_bitrate_bps, plan.audio_bitrate_bps
            );

            let encode = match self.build_attempt(source, &candidate, plan, probe.has_audio, pass_mode, attempt) {
                Ok(encode) => encode,
                Err(cause) => return CompressionResult::Failed { cause },
            };
            if !claims.claim(&[&encode.output_path, &encode.passlog_prefix]) {
                return CompressionResult::Failed {
                    cause: DomainError::BadArgs(format!(
                        "Output path {} is in use by another request",
                        encode.output_path.display()
                    )),
                };
            }

            produced.push(encode.output_path.clone());
            if let Err(cause) = self.encode_port.encode(&encode).await {
                return CompressionResult::Failed { cause };
            }

            // The previous intermediate has been consumed
            if candidate != source {
                self.retire(&candidate, produced).await;
            }

            let size = match self.fs_port.file_size(&encode.output_path).await {
                Ok(size) => size,
                Err(cause) => return CompressionResult::Failed { cause },
            };
            info!(
                "Attempt {} produced {} ({} bytes, budget {} bytes)",
                attempt,
                format_file_size(size),
                size,
                budget.bytes()
            );

            if budget.admits(size) {
                return CompressionResult::success(encode.output_path, size, attempt);
            }
            if size >= previous_size {
                return CompressionResult::Rejected {
                    reason: RejectionReason::SizeNotReducible {
                        attempt,
                        previous_size_bytes: previous_size,
                        current_size_bytes: size,
                    },
                };
            }

            previous_size = size;
            candidate = encode.output_path;
        }

        CompressionResult::Rejected {
            reason: RejectionReason::IterationLimitReached {
                attempts: self.settings.max_iterations,
                last_size_bytes: previous_size,
            },
        }
    }

    fn build_attempt(
        &self,
        source: &Path,
        candidate: &Path,
        plan: BitratePlan,
        has_audio: bool,
        pass_mode: PassMode,
        attempt: u32,
    ) -> Result<EncodeAttempt, DomainError> {
        let output_path = derive_output_path(
            source,
            self.settings.output_dir.as_deref(),
            &self.settings.filename_prefix,
            &self.settings.output_extension,
            attempt,
        )?;
        if output_path == source || output_path == candidate {
            return Err(DomainError::BadArgs(format!(
                "Output path {} would overwrite its input",
                output_path.display()
            )));
        }

        let passlog_prefix = passlog_prefix(source, &output_path, self.settings.passlog_dir.as_deref());
        Ok(EncodeAttempt {
            input_path: candidate.to_path_buf(),
            output_path,
            plan,
            has_audio,
            pass_mode,
            passlog_prefix,
        })
    }

    async fn prepare_directories(&self) -> Result<(), DomainError> {
        for dir in [&self.settings.output_dir, &self.settings.passlog_dir]
            .into_iter()
            .flatten()
        {
            self.fs_port.create_directory(dir).await?;
        }
        Ok(())
    }

    async fn retire(&self, path: &Path, produced: &mut Vec<PathBuf>) {
        if self.settings.keep_intermediates {
            return;
        }
        match self.fs_port.remove_file(path).await {
            Ok(()) => produced.retain(|p| p != path),
            Err(e) => warn!("Could not remove intermediate {}: {}", path.display(), e),
        }
    }

    async fn cleanup(&self, produced: &[PathBuf], keep: Option<&PathBuf>) {
        if self.settings.keep_intermediates {
            return;
        }
        for path in produced.iter().filter(|p| Some(*p) != keep) {
            if let Err(e) = self.fs_port.remove_file(path).await {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}
