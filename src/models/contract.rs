//! Data contract root document
//!
//! [`DataContractSpecification`] is the hub every importer produces and the
//! exporter consumes. One instance is owned by a single conversion call.

use super::extensions::Extensions;
use super::model::Model;
use super::server::Server;
use crate::export::ExportError;
use crate::import::ImportError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Version of the contract document format produced by this crate.
pub const SPECIFICATION_VERSION: &str = "1.1.0";

/// Contact details of the contract owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.url.is_none() && self.email.is_none()
    }
}

/// Descriptive metadata. Attributes such as `dataProduct`, `tenant`,
/// `domain` or arbitrary custom properties are kept in `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Terms of use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terms {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_period: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retention {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Period such as `1y` or `P1Y`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlimited: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_field: Option<String>,
}

/// Service levels with a dedicated contract slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceLevel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<Retention>,
}

impl ServiceLevel {
    pub fn is_empty(&self) -> bool {
        self.availability.is_none() && self.retention.is_none()
    }
}

/// Root data contract document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataContractSpecification {
    #[serde(default = "default_specification_version")]
    pub data_contract_specification: String,
    pub id: String,
    #[serde(default)]
    pub info: Info,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub servers: IndexMap<String, Server>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<Terms>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub models: IndexMap<String, Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servicelevels: Option<ServiceLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_specification_version() -> String {
    SPECIFICATION_VERSION.to_string()
}

impl DataContractSpecification {
    /// Empty contract with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            data_contract_specification: default_specification_version(),
            id: id.into(),
            info: Info::default(),
            servers: IndexMap::new(),
            terms: None,
            models: IndexMap::new(),
            servicelevels: None,
            tags: Vec::new(),
        }
    }

    /// Fresh contract with a random id and placeholder title and version,
    /// used as the starting point for DDL imports.
    pub fn template(title: impl Into<String>, version: impl Into<String>) -> Self {
        let mut contract = Self::new(uuid::Uuid::new_v4().to_string());
        contract.info.title = title.into();
        contract.info.version = version.into();
        contract
    }

    /// Parse a contract document from YAML (or JSON) text.
    pub fn from_yaml(content: &str) -> Result<Self, ImportError> {
        serde_yaml::from_str(content).map_err(|e| {
            ImportError::parse("dcs", "<inline>", format!("Failed to parse contract: {}", e), e)
        })
    }

    pub fn to_yaml(&self) -> Result<String, ExportError> {
        serde_yaml::to_string(self).map_err(|e| {
            ExportError::Serialization(format!("Failed to serialize contract: {}", e))
        })
    }
}
