//! Storage reader abstraction
//!
//! Raw file acquisition for contract validation lives outside the conversion
//! core. A [`StorageReader`] lists the files matching a location pattern and
//! reads them as bytes:
//! - [`LocalStorageReader`](local::LocalStorageReader): local file system
//!   (feature `native-fs`)
//!
//! Object-storage readers resolve their [`credentials`] from the environment
//! before any network access, so a missing variable fails fast with a
//! configuration error naming it.

pub mod credentials;
#[cfg(feature = "native-fs")]
pub mod local;

use crate::config::ConfigError;
use async_trait::async_trait;
use std::fmt;

pub use credentials::{AzureCredentials, S3Credentials, StorageCredentials};
#[cfg(feature = "native-fs")]
pub use local::LocalStorageReader;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid location pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// One file found by [`StorageReader::list`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageHandle {
    location: String,
}

impl StorageHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl fmt::Display for StorageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Source of raw contract data files.
#[async_trait(?Send)]
pub trait StorageReader {
    /// Files matching a glob pattern, in a stable order.
    async fn list(&self, pattern: &str) -> Result<Vec<StorageHandle>, StorageError>;

    /// Full content of one file.
    async fn read(&self, handle: &StorageHandle) -> Result<Vec<u8>, StorageError>;
}

/// Read every file matching `pattern`.
///
/// Fails on the first file that cannot be read.
pub async fn read_all<R: StorageReader + ?Sized>(
    reader: &R,
    pattern: &str,
) -> Result<Vec<(StorageHandle, Vec<u8>)>, StorageError> {
    let handles = reader.list(pattern).await?;
    let mut files = Vec::with_capacity(handles.len());
    for handle in handles {
        tracing::info!("Downloading file {}", handle);
        let content = reader.read(&handle).await?;
        files.push((handle, content));
    }
    Ok(files)
}
