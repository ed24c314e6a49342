//! Validation functionality
//!
//! Input checks on imported identifiers and type tokens.

pub mod input;

pub use input::{ValidationError, validate_field_name, validate_model_name, validate_physical_type};
