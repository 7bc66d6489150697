//! Output and pass-log path derivation

use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;

/// Output path for one attempt: `<dir>/<source stem><prefix>[<attempt>].<extension>`.
///
/// Names derive from the original source and the attempt index only, so
/// attempts never collide with each other or with the source. The first
/// attempt carries no index, matching the single-shot name.
pub fn derive_output_path(
    source: &Path,
    output_dir: Option<&Path>,
    prefix: &str,
    extension: &str,
    attempt: u32,
) -> Result<PathBuf, DomainError> {
    let stem = source
        .file_stem()
        .ok_or_else(|| DomainError::BadArgs(format!("Invalid input file path: {}", source.display())))?
        .to_string_lossy();
    let extension = extension.trim_start_matches('.');

    let file_name = if attempt > 1 {
        format!("{}{}{}.{}", stem, prefix, attempt, extension)
    } else {
        format!("{}{}.{}", stem, prefix, extension)
    };

    let dir = output_dir.or_else(|| source.parent()).unwrap_or(Path::new(""));
    Ok(dir.join(file_name))
}

/// Pass-log prefix for one attempt, optionally relocated to `passlog_dir`.
///
/// The source extension is part of the name, so `clip.mov` and `clip.mp4`
/// never share statistics even though both encode to `clip<prefix>.mp4`.
pub fn passlog_prefix(source: &Path, output: &Path, passlog_dir: Option<&Path>) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "crunch".to_string());
    let name = match source.extension() {
        Some(ext) => format!("{}-{}-passlog", stem, ext.to_string_lossy()),
        None => format!("{}-passlog", stem),
    };
    let dir = passlog_dir.or_else(|| output.parent()).unwrap_or(Path::new(""));
    dir.join(name)
}
