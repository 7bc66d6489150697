// TOML config adapter - Configuration loading with file and environment layers

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::errors::*;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "crunch.toml";

/// Runtime configuration.
///
/// Precedence: CLI > environment (`CRUNCH_*`) > config file > defaults.
/// The file keeps its keys under a `[crunch]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrunchConfig {
    /// ffmpeg binary (name on PATH or full path)
    pub ffmpeg_path: String,
    /// ffprobe binary (name on PATH or full path)
    pub ffprobe_path: String,
    /// Inserted between the source stem and the extension of every output
    pub filename_prefix: String,
    /// Extension of every output, regardless of the source container
    pub output_extension: String,
    pub video_codec: String,
    pub audio_codec: String,
    /// Encode attempts per request before giving up
    pub max_iterations: u32,
    pub probe_timeout_secs: u64,
    pub encode_timeout_secs: u64,
    /// Directory for outputs; defaults to the source file's directory
    pub output_dir: Option<PathBuf>,
    /// Directory for two-pass statistics; defaults to the output directory
    pub passlog_dir: Option<PathBuf>,
    /// Keep superseded intermediate files instead of deleting them
    pub keep_intermediates: bool,
}

impl Default for CrunchConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            filename_prefix: "crunch_".to_string(),
            output_extension: "mp4".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            max_iterations: 5,
            probe_timeout_secs: 30,
            encode_timeout_secs: 3600,
            output_dir: None,
            passlog_dir: None,
            keep_intermediates: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    crunch: CrunchConfig,
}

impl CrunchConfig {
    /// Parse a TOML document with a `[crunch]` table
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| DomainError::ConfigError(format!("Failed to parse TOML config: {}", e)))?;
        Ok(file.crunch)
    }

    /// Serialize back to the on-disk layout
    pub fn to_toml_string(&self) -> Result<String, DomainError> {
        #[derive(Serialize)]
        struct Out<'a> {
            crunch: &'a CrunchConfig,
        }
        toml::to_string(&Out { crunch: self })
            .map_err(|e| DomainError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Apply `CRUNCH_*` overrides; `lookup` is `std::env::var` outside of tests
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<usize, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;

        if let Some(v) = lookup("CRUNCH_FFMPEG") {
            self.ffmpeg_path = v;
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_FFPROBE") {
            self.ffprobe_path = v;
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_PREFIX") {
            self.filename_prefix = v;
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_MAX_ITERATIONS") {
            self.max_iterations = parse_env("CRUNCH_MAX_ITERATIONS", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_PROBE_TIMEOUT_SECS") {
            self.probe_timeout_secs = parse_env("CRUNCH_PROBE_TIMEOUT_SECS", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_ENCODE_TIMEOUT_SECS") {
            self.encode_timeout_secs = parse_env("CRUNCH_ENCODE_TIMEOUT_SECS", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_OUTPUT_DIR") {
            self.output_dir = Some(PathBuf::from(v));
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_PASSLOG_DIR") {
            self.passlog_dir = Some(PathBuf::from(v));
            applied += 1;
        }
        if let Some(v) = lookup("CRUNCH_KEEP_INTERMEDIATES") {
            self.keep_intermediates = parse_env("CRUNCH_KEEP_INTERMEDIATES", &v)?;
            applied += 1;
        }

        Ok(applied)
    }

    /// Reject settings the compressor cannot work with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.ffmpeg_path.trim().is_empty() || self.ffprobe_path.trim().is_empty() {
            return Err(DomainError::ConfigError(
                "ffmpeg_path and ffprobe_path must not be empty".to_string(),
            ));
        }
        // An empty prefix would make the first output overwrite an .mp4 source
        if self.filename_prefix.is_empty() {
            return Err(DomainError::ConfigError(
                "filename_prefix must not be empty".to_string(),
            ));
        }
        if self.filename_prefix.contains(['/', '\\']) {
            return Err(DomainError::ConfigError(
                "filename_prefix must not contain path separators".to_string(),
            ));
        }
        let extension = self.output_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(DomainError::ConfigError(format!(
                "Invalid output_extension: {:?}",
                self.output_extension
            )));
        }
        if self.max_iterations == 0 {
            return Err(DomainError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.probe_timeout_secs == 0 || self.encode_timeout_secs == 0 {
            return Err(DomainError::ConfigError(
                "Timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DomainError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| DomainError::ConfigError(format!("Invalid value for {}: {:?} ({})", key, value, e)))
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Read a config file from disk
    pub fn load_file(path: &Path) -> Result<CrunchConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        CrunchConfig::from_toml_str(&content)
    }

    /// Build the effective configuration from defaults, file and environment.
    ///
    /// An explicit path must exist; without one, [`DEFAULT_CONFIG_FILE`] is
    /// used only when present.
    pub fn load(explicit: Option<&Path>) -> Result<CrunchConfig, DomainError> {
        let mut config = match explicit {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Self::load_file(path)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                Self::load_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => CrunchConfig::default(),
        };

        let overrides = config.apply_env(|key| std::env::var(key).ok())?;
        if overrides > 0 {
            info!("Applied {} environment variable overrides", overrides);
        }

        Ok(config)
    }
}
