// Local filesystem adapter - File system operations backed by tokio::fs

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::ports::*;

/// Local filesystem adapter
#[derive(Debug, Default, Clone)]
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    /// Create new local filesystem adapter
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsPort for LocalFsAdapter {
    async fn file_exists(&self, path: &Path) -> Result<bool, DomainError> {
        tokio::fs::try_exists(path).await.map_err(|e| {
            DomainError::FsFail(format!("Failed to check {}: {}", path.display(), e))
        })
    }

    async fn file_size(&self, path: &Path) -> Result<u64, DomainError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            DomainError::FsFail(format!("Failed to get size of {}: {}", path.display(), e))
        })?;
        Ok(metadata.len())
    }

    async fn remove_file(&self, path: &Path) -> Result<(), DomainError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::FsFail(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn create_directory(&self, path: &Path) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(path).await.map_err(|e| {
            DomainError::FsFail(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })
    }
}
