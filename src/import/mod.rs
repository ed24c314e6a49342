//! Import functionality
//!
//! Every importer produces a [`DataContractSpecification`](crate::models::DataContractSpecification):
//! - SQL (CREATE TABLE / CREATE VIEW statements in a selected dialect)
//! - ODCS (Open Data Contract Standard) v3 YAML or JSON
//!
//! Imports are all-or-nothing. A failure returns an [`ImportError`] and no
//! partially built document.

pub mod odcs;
pub mod sql;

use crate::config::ConfigError;
use std::error::Error as StdError;
use std::path::Path;

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Malformed DDL or document
    #[error("Parse error in {stage} source '{name}': {reason}")]
    Parse {
        stage: &'static str,
        name: String,
        reason: String,
        #[source]
        cause: Option<Cause>,
    },
    /// A referenced local file could not be read
    #[error("IO error reading '{path}': {reason}")]
    Io {
        path: String,
        reason: String,
        #[source]
        cause: Option<std::io::Error>,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl ImportError {
    pub fn parse(
        stage: &'static str,
        name: impl Into<String>,
        reason: impl Into<String>,
        cause: impl Into<Cause>,
    ) -> Self {
        ImportError::Parse {
            stage,
            name: name.into(),
            reason: reason.into(),
            cause: Some(cause.into()),
        }
    }

    /// Importer stage that failed (`sql`, `odcs`, `dcs`)
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            ImportError::Parse { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Source identifier the error refers to
    pub fn name(&self) -> Option<&str> {
        match self {
            ImportError::Parse { name, .. } => Some(name),
            ImportError::Io { path, .. } => Some(path),
            ImportError::Configuration(_) => None,
        }
    }

    /// Human readable reason
    pub fn reason(&self) -> String {
        match self {
            ImportError::Parse { reason, .. } | ImportError::Io { reason, .. } => reason.clone(),
            ImportError::Configuration(e) => e.to_string(),
        }
    }
}

/// Read a local source file, mapping failures to [`ImportError::Io`].
pub(crate) fn read_source(path: &Path) -> Result<String, ImportError> {
    if !path.exists() {
        return Err(ImportError::Io {
            path: path.display().to_string(),
            reason: format!("The file '{}' does not exist.", path.display()),
            cause: None,
        });
    }
    std::fs::read_to_string(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
        cause: Some(e),
    })
}

// Re-export for convenience
pub use odcs::OdcsImporter;
pub use sql::SqlImporter;
