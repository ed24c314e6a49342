//! Quality rule attached to a model or field.

use super::extensions::Extensions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Quality rule in contract vocabulary.
///
/// Attributes only known to other formats (business impact, severity,
/// scheduling) are kept in `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// SQL dialect of `query`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_be: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_not_be: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_be_greater_than: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_be_greater_than_or_equal_to: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_be_less_than: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_be_less_than_or_equal_to: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_be_between: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_not_be_between: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Value>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Quality {
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: Some(rule_type.into()),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
