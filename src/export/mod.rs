//! Export functionality
//!
//! Provides exporters from the data contract hub document:
//! - ODCS (Open Data Contract Standard) v3

pub mod odcs;

/// Error during export
#[derive(Debug, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// Re-export for convenience
pub use odcs::OdcsExporter;
