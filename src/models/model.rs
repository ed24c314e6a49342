//! Model (table or view) within a data contract.

use super::extensions::Extensions;
use super::field::Field;
use super::quality::Quality;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Model keyed by name in [`DataContractSpecification::models`](super::DataContractSpecification).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Physical kind, e.g. `table` or `view`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality: Vec<Quality>,
    #[serde(rename = "config", default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl Model {
    pub fn new(model_type: impl Into<String>) -> Self {
        Self {
            model_type: Some(model_type.into()),
            ..Default::default()
        }
    }

    pub fn table() -> Self {
        Self::new("table")
    }

    pub fn view() -> Self {
        Self::new("view")
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Names of primary key fields, in field order.
    pub fn primary_key_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.is_primary_key())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn has_composite_primary_key(&self) -> bool {
        self.primary_key_fields().len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalType;

    #[test]
    fn test_primary_key_fields_in_order() {
        let mut a = Field::new(CanonicalType::Integer);
        a.mark_primary_key();
        let mut c = Field::new(CanonicalType::Integer);
        c.mark_primary_key();
        let model = Model::table()
            .with_field("a", a)
            .with_field("b", Field::new(CanonicalType::String))
            .with_field("c", c);
        assert_eq!(model.primary_key_fields(), vec!["a", "c"]);
        assert!(model.has_composite_primary_key());
    }

    #[test]
    fn test_absent_flags_are_not_serialized() {
        let model = Model::table().with_field("id", Field::new(CanonicalType::Long));
        let yaml = serde_yaml::to_string(&model).unwrap();
        assert!(yaml.contains("type: long"));
        assert!(!yaml.contains("required"));
        assert!(!yaml.contains("config"));
    }
}
