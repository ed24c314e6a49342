//! ODCS v3 root document

use super::schema::SchemaObject;
use super::supporting::{
    CustomProperty, Description, Price, Server, ServiceLevelAgreementProperty, Support,
};
use crate::export::ExportError;
use crate::import::ImportError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ODCS version written by the exporter.
pub const ODCS_API_VERSION: &str = "v3.0.1";

/// Statuses the ODCS standard accepts.
pub const ODCS_STATUSES: [&str; 5] = ["proposed", "draft", "active", "deprecated", "retired"];

/// Open Data Contract Standard document.
///
/// Keys this type does not model are kept in `extra` so a parsed document
/// serializes back without losing them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenDataContractStandard {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<SchemaObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub support: Vec<Support>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sla_properties: Vec<ServiceLevelAgreementProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_properties: Vec<CustomProperty>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn default_api_version() -> String {
    ODCS_API_VERSION.to_string()
}

fn default_kind() -> String {
    "DataContract".to_string()
}

impl Default for OpenDataContractStandard {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            id: String::new(),
            name: None,
            version: String::new(),
            status: "draft".to_string(),
            domain: None,
            data_product: None,
            tenant: None,
            description: None,
            schema: Vec::new(),
            servers: Vec::new(),
            support: Vec::new(),
            sla_properties: Vec::new(),
            price: None,
            tags: Vec::new(),
            custom_properties: Vec::new(),
            extra: IndexMap::new(),
        }
    }
}

impl OpenDataContractStandard {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Parse an ODCS document from YAML or JSON text.
    ///
    /// `source_name` identifies the input in error messages.
    pub fn from_yaml(content: &str, source_name: &str) -> Result<Self, ImportError> {
        serde_yaml::from_str(content).map_err(|e| {
            ImportError::parse(
                "odcs",
                source_name,
                format!("Failed to parse ODCS document: {}", e),
                e,
            )
        })
    }

    pub fn to_yaml(&self) -> Result<String, ExportError> {
        serde_yaml::to_string(self).map_err(|e| {
            ExportError::Serialization(format!("Failed to serialize ODCS document: {}", e))
        })
    }

    pub fn custom_property(&self, name: &str) -> Option<&Value> {
        self.custom_properties
            .iter()
            .find(|p| p.property == name)
            .map(|p| &p.value)
    }

    pub fn sla_property(&self, name: &str) -> Option<&ServiceLevelAgreementProperty> {
        self.sla_properties.iter().find(|p| p.property == name)
    }
}
