//! Data Contract SDK - conversion between data contract representations
//!
//! Provides:
//! - SQL DDL import in a selected dialect
//! - ODCS (Open Data Contract Standard) v3 import and export
//! - Canonical type resolution shared by every conversion
//! - Storage readers and quality engine connection rendering for validation
//!
//! Every importer produces a [`DataContractSpecification`], the hub document
//! that exporters project from.

pub mod config;
pub mod connections;
pub mod export;
pub mod import;
pub mod models;
pub mod storage;
pub mod types;
pub mod validation;

pub use config::{ConfigError, ConverterConfig, EnvLookup, ProcessEnv};
pub use export::{ExportError, OdcsExporter};
pub use import::{ImportError, OdcsImporter, SqlImporter};
pub use models::odcs::OpenDataContractStandard;
pub use models::{DataContractSpecification, Extensions, Field, Model, Server};
#[cfg(feature = "native-fs")]
pub use storage::LocalStorageReader;
pub use storage::{StorageError, StorageHandle, StorageReader};
pub use types::{CanonicalType, Dialect, DialectInfo, TypeHint, resolve};
