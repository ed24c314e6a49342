//! Field model
//!
//! One column of a model. Flags and sizes are optional so that a value the
//! source never stated stays absent through every conversion.

use super::extensions::Extensions;
use super::quality::Quality;
use crate::types::CanonicalType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field within a [`Model`](super::Model).
///
/// # Example
///
/// ```rust
/// use data_contract_sdk::models::Field;
/// use data_contract_sdk::types::CanonicalType;
///
/// let field = Field::new(CanonicalType::String)
///     .with_max_length(100)
///     .with_required(true);
/// assert_eq!(field.max_length, Some(100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<CanonicalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality: Vec<Quality>,
    /// Vendor physical types and other attributes without a first-class slot
    #[serde(rename = "config", default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl Field {
    pub fn new(field_type: CanonicalType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    pub fn with_max_length(mut self, max_length: u64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision_scale(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark as part of the primary key: required, unique and key member.
    pub fn mark_primary_key(&mut self) {
        self.required = Some(true);
        self.unique = Some(true);
        self.primary_key = Some(true);
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key.unwrap_or(false)
    }
}
