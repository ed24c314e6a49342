//! Local file system storage reader
//!
//! Lists files with `glob` patterns and reads them with `tokio::fs`.
//! Relative patterns are resolved against an optional base directory.

use super::{StorageError, StorageHandle, StorageReader};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local file system storage reader
#[derive(Debug, Clone, Default)]
pub struct LocalStorageReader {
    base_path: Option<PathBuf>,
}

impl LocalStorageReader {
    /// Reader resolving relative patterns against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader resolving relative patterns against `base_path`.
    ///
    /// ```rust
    /// use data_contract_sdk::storage::LocalStorageReader;
    ///
    /// let reader = LocalStorageReader::with_base("/data/contracts");
    /// ```
    pub fn with_base(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: Some(base_path.as_ref().to_path_buf()),
        }
    }

    fn resolve_pattern(&self, pattern: &str) -> String {
        match &self.base_path {
            Some(base) if !Path::new(pattern).is_absolute() => {
                base.join(pattern).to_string_lossy().into_owned()
            }
            _ => pattern.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl StorageReader for LocalStorageReader {
    async fn list(&self, pattern: &str) -> Result<Vec<StorageHandle>, StorageError> {
        let resolved = self.resolve_pattern(pattern);
        let paths = glob::glob(&resolved).map_err(|e| StorageError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let mut handles = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| StorageError::Io(e.to_string()))?;
            if path.is_file() {
                handles.push(StorageHandle::new(path.to_string_lossy()));
            }
        }
        handles.sort();
        tracing::debug!("Pattern '{}' matched {} file(s)", resolved, handles.len());
        Ok(handles)
    }

    async fn read(&self, handle: &StorageHandle) -> Result<Vec<u8>, StorageError> {
        fs::read(handle.location()).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(handle.location().to_string())
            } else {
                StorageError::Io(format!("Failed to read file {}: {}", handle, e))
            }
        })
    }
}
