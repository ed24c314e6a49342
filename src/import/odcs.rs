//! ODCS (Open Data Contract Standard) v3 importer
//!
//! Projects an ODCS document onto the data contract hub document. Attributes
//! that have no first-class slot on the target go into the owning entity's
//! extension map so that the exporter can restore them.

use super::{ImportError, read_source};
use crate::models::odcs::{
    DataQuality, OpenDataContractStandard, SchemaObject, SchemaProperty,
    ServiceLevelAgreementProperty,
};
use crate::models::odcs::supporting::Server as OdcsServer;
use crate::models::{
    Availability, Contact, DataContractSpecification, Field, Info, Model, Quality, Retention,
    Server, ServerRole, ServiceLevel, Terms,
};
use crate::types::{Dialect, DialectInfo, TypeAliases, TypeHint, resolve};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;

/// SLA property holding the availability description.
pub(crate) const SLA_AVAILABILITY: &str = "generalAvailability";
/// SLA property holding the retention period.
pub(crate) const SLA_RETENTION: &str = "retention";

/// Info extensions that map onto first-class ODCS root attributes.
pub(crate) const INFO_DOMAIN: &str = "domain";
pub(crate) const INFO_DATA_PRODUCT: &str = "dataProduct";
pub(crate) const INFO_TENANT: &str = "tenant";

/// Model extension holding an ODCS `physicalName` that differs from the name.
pub(crate) const MODEL_PHYSICAL_NAME: &str = "physicalName";

/// ODCS property attributes kept in field extensions.
pub(crate) const PROPERTY_CRITICAL_DATA_ELEMENT: &str = "criticalDataElement";
pub(crate) const PROPERTY_ENCRYPTED_NAME: &str = "encryptedName";
pub(crate) const PROPERTY_PARTITIONED: &str = "partitioned";
pub(crate) const PROPERTY_PARTITION_KEY_POSITION: &str = "partitionKeyPosition";
pub(crate) const PROPERTY_PRIMARY_KEY_POSITION: &str = "primaryKeyPosition";
pub(crate) const PROPERTY_MIN_LENGTH: &str = "minLength";
pub(crate) const PROPERTY_PATTERN: &str = "pattern";
pub(crate) const PROPERTY_FORMAT: &str = "format";

/// ODCS quality attributes kept in quality extensions.
pub(crate) const QUALITY_EXTENSION_KEYS: [&str; 8] = [
    "businessImpact",
    "dimension",
    "rule",
    "schedule",
    "scheduler",
    "severity",
    "method",
    "customProperties",
];

static RE_STORAGE_ACCOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:@|://)([^.]+)\.").expect("Invalid regex"));

/// Storage account name from an Azure location URI.
///
/// Matches `...@<account>.` or `...://<account>.`. A location that does not
/// follow either form yields `None`; that is a data quality issue in the
/// source document, not an import failure.
///
/// ```rust
/// use data_contract_sdk::import::odcs::extract_storage_account;
///
/// assert_eq!(
///     extract_storage_account("abfss://data@myaccount.dfs.core.windows.net/path"),
///     Some("myaccount".to_string()),
/// );
/// assert_eq!(
///     extract_storage_account("https://myaccount.blob.core.windows.net/c"),
///     Some("myaccount".to_string()),
/// );
/// assert_eq!(extract_storage_account("local/path"), None);
/// ```
pub fn extract_storage_account(location: &str) -> Option<String> {
    if let Some(at) = location.find('@') {
        let caps = RE_STORAGE_ACCOUNT.captures(&location[at..])?;
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    RE_STORAGE_ACCOUNT
        .captures(location)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// ODCS v3 importer.
///
/// # Example
///
/// ```rust
/// use data_contract_sdk::import::OdcsImporter;
///
/// let yaml = r#"
/// apiVersion: v3.0.1
/// kind: DataContract
/// id: orders
/// name: Orders
/// version: 1.0.0
/// status: active
/// schema:
///   - name: orders
///     physicalType: table
///     properties:
///       - name: order_id
///         physicalType: bigint
///         primaryKey: true
/// "#;
/// let contract = OdcsImporter::new().import_str(yaml).unwrap();
/// assert_eq!(contract.id, "orders");
/// assert!(contract.models["orders"].fields.contains_key("order_id"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OdcsImporter {
    dialect: Option<Dialect>,
}

impl OdcsImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store physical types under this dialect's key instead of inferring it
    /// from the first server.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Import an ODCS document from YAML or JSON text.
    pub fn import_str(&self, content: &str) -> Result<DataContractSpecification, ImportError> {
        self.import_named(content, "<inline>")
    }

    /// Import from text; `source_name` identifies the input in errors.
    pub fn import_named(
        &self,
        content: &str,
        source_name: &str,
    ) -> Result<DataContractSpecification, ImportError> {
        let odcs = OpenDataContractStandard::from_yaml(content, source_name)?;
        Ok(self.import(&odcs))
    }

    /// Import an ODCS document from a local file.
    pub fn import_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<DataContractSpecification, ImportError> {
        let path = path.as_ref();
        let content = read_source(path)?;
        self.import_named(&content, &path.display().to_string())
    }

    /// Project a parsed ODCS document onto a new contract.
    pub fn import(&self, odcs: &OpenDataContractStandard) -> DataContractSpecification {
        let mut contract = DataContractSpecification::new(odcs.id.clone());
        contract.info = import_info(odcs);
        contract.servers = import_servers(&odcs.servers);
        contract.terms = import_terms(odcs);
        contract.servicelevels = import_service_levels(&odcs.sla_properties);
        contract.tags = odcs.tags.clone();

        let dialect = self.physical_type_dialect(odcs);
        let aliases = TypeAliases::from_properties(
            odcs.custom_properties
                .iter()
                .map(|p| (p.property.as_str(), &p.value)),
        );
        for schema in &odcs.schema {
            if contract.models.contains_key(&schema.name) {
                tracing::warn!("Schema '{}' defined more than once; keeping the last", schema.name);
            }
            contract
                .models
                .insert(schema.name.clone(), import_model(schema, dialect, &aliases));
        }

        tracing::info!(
            "Imported ODCS contract '{}' with {} model(s) and {} server(s)",
            contract.id,
            contract.models.len(),
            contract.servers.len()
        );
        contract
    }

    fn physical_type_dialect(&self, odcs: &OpenDataContractStandard) -> Dialect {
        if let Some(dialect) = self.dialect {
            return dialect;
        }
        odcs.servers
            .iter()
            .find(|s| s.server.is_some())
            .map(|s| DialectInfo::lookup(&s.server_type).dialect)
            .unwrap_or_default()
    }
}

fn import_info(odcs: &OpenDataContractStandard) -> Info {
    let mut info = Info {
        title: odcs.name.clone().unwrap_or_default(),
        version: odcs.version.clone(),
        ..Default::default()
    };
    if !odcs.status.is_empty() {
        info.status = Some(odcs.status.clone());
    }
    info.description = odcs.description.as_ref().and_then(|d| d.purpose.clone());

    for property in &odcs.custom_properties {
        if property.property == "owner" {
            info.owner = Some(value_to_text(&property.value));
        } else {
            info.extensions
                .insert(property.property.clone(), property.value.clone());
        }
    }
    info.extensions.insert_opt(INFO_DOMAIN, odcs.domain.clone());
    info.extensions
        .insert_opt(INFO_DATA_PRODUCT, odcs.data_product.clone());
    info.extensions.insert_opt(INFO_TENANT, odcs.tenant.clone());
    for (key, value) in &odcs.extra {
        if info.extensions.contains_key(key) {
            tracing::warn!(
                "ODCS attribute '{}' clashes with a custom property; keeping the custom property",
                key
            );
            continue;
        }
        tracing::debug!("Keeping ODCS attribute '{}' as an info extension", key);
        info.extensions.insert(key.clone(), value.clone());
    }

    info.contact = import_contact(odcs);
    info
}

fn import_contact(odcs: &OpenDataContractStandard) -> Option<Contact> {
    let mut contact = Contact::default();
    for support in &odcs.support {
        let Some(url) = support.url.as_deref() else {
            continue;
        };
        if let Some(email) = url.strip_prefix("mailto:") {
            contact.email.get_or_insert_with(|| email.to_string());
        } else if support.channel == "email" {
            contact.email.get_or_insert_with(|| url.to_string());
        } else {
            contact.url.get_or_insert_with(|| url.to_string());
        }
    }
    (!contact.is_empty()).then_some(contact)
}

fn import_servers(servers: &[OdcsServer]) -> indexmap::IndexMap<String, Server> {
    let mut result = indexmap::IndexMap::new();
    for odcs_server in servers {
        let Some(name) = odcs_server.server.clone() else {
            tracing::warn!("Server name is missing, skipping server");
            continue;
        };

        let server_type = (!odcs_server.server_type.is_empty())
            .then(|| odcs_server.server_type.clone());
        let storage_account = if server_type.as_deref() == Some("azure") {
            odcs_server
                .location
                .as_deref()
                .and_then(extract_storage_account)
        } else {
            None
        };

        let server = Server {
            server_type,
            description: odcs_server.description.clone(),
            environment: odcs_server.environment.clone(),
            account: odcs_server.account.clone(),
            storage_account,
            host: odcs_server.host.clone(),
            port: odcs_server.port,
            database: odcs_server.database.clone(),
            schema: odcs_server.schema.clone(),
            catalog: odcs_server.catalog.clone(),
            project: odcs_server.project.clone(),
            dataset: odcs_server.dataset.clone(),
            location: odcs_server.location.clone(),
            path: odcs_server.path.clone(),
            format: odcs_server.format.clone(),
            delimiter: odcs_server.delimiter.clone(),
            endpoint_url: odcs_server.endpoint_url.clone(),
            topic: odcs_server.topic.clone(),
            http_path: odcs_server.http_path.clone(),
            driver: odcs_server.driver.clone(),
            token: odcs_server.token.clone(),
            roles: odcs_server
                .roles
                .iter()
                .map(|role| ServerRole {
                    name: role.role.clone(),
                    description: role.description.clone(),
                })
                .collect(),
        };
        for key in odcs_server.extra.keys() {
            tracing::warn!("Server '{}': attribute '{}' dropped", name, key);
        }
        result.insert(name, server);
    }
    result
}

fn import_terms(odcs: &OpenDataContractStandard) -> Option<Terms> {
    let description = odcs.description.as_ref();
    let usage = description.and_then(|d| d.usage.clone());
    let limitations = description.and_then(|d| d.limitations.clone());
    let billing = odcs.price.as_ref().and_then(|price| {
        let amount = price.price_amount.as_ref().map(value_to_text)?;
        let mut billing = amount;
        if let Some(currency) = &price.price_currency {
            billing.push(' ');
            billing.push_str(currency);
        }
        if let Some(unit) = &price.price_unit {
            billing.push_str(" / ");
            billing.push_str(unit);
        }
        Some(billing)
    });

    if usage.is_none() && limitations.is_none() && billing.is_none() {
        return None;
    }
    let mut terms = Terms {
        description: description.and_then(|d| d.purpose.clone()),
        usage,
        limitations,
        billing,
        ..Default::default()
    };
    if let Some(d) = description {
        for (key, value) in &d.extra {
            terms.extensions.insert(key.clone(), value.clone());
        }
    }
    Some(terms)
}

fn find_sla<'a>(
    properties: &'a [ServiceLevelAgreementProperty],
    name: &str,
) -> Option<&'a ServiceLevelAgreementProperty> {
    properties.iter().find(|p| p.property == name)
}

fn import_service_levels(properties: &[ServiceLevelAgreementProperty]) -> Option<ServiceLevel> {
    let availability = find_sla(properties, SLA_AVAILABILITY).map(|p| Availability {
        description: Some(value_to_text(&p.value)),
        percentage: None,
    });
    let retention = find_sla(properties, SLA_RETENTION).map(|p| Retention {
        period: Some(format!(
            "{}{}",
            value_to_text(&p.value),
            p.unit.as_deref().unwrap_or_default()
        )),
        timestamp_field: p.element.clone(),
        ..Default::default()
    });

    let levels = ServiceLevel {
        availability,
        retention,
    };
    (!levels.is_empty()).then_some(levels)
}

fn import_model(schema: &SchemaObject, dialect: Dialect, aliases: &TypeAliases) -> Model {
    let mut model = Model {
        model_type: schema.physical_type.clone(),
        title: schema.business_name.clone(),
        description: schema.description.clone(),
        tags: schema.tags.clone(),
        quality: schema.quality.iter().map(import_quality).collect(),
        ..Default::default()
    };
    if let Some(physical_name) = &schema.physical_name
        && physical_name != &schema.name
    {
        model
            .extensions
            .insert(MODEL_PHYSICAL_NAME, physical_name.clone());
    }
    for property in &schema.custom_properties {
        model
            .extensions
            .insert(property.property.clone(), property.value.clone());
    }
    for (key, value) in &schema.extra {
        model.extensions.insert(key.clone(), value.clone());
    }

    let composite_key = schema.primary_key_count() > 1;
    for property in &schema.properties {
        let mut field = import_field(property, dialect, aliases);
        if composite_key && field.primary_key == Some(true) {
            field.mark_primary_key();
        }
        model.fields.insert(property.name.clone(), field);
    }

    tracing::debug!(
        "Imported schema '{}' with {} field(s)",
        schema.name,
        model.fields.len()
    );
    model
}

fn import_field(property: &SchemaProperty, dialect: Dialect, aliases: &TypeAliases) -> Field {
    let type_token = property
        .physical_type
        .as_deref()
        .or(property.logical_type.as_deref());

    let mut field = Field {
        field_type: type_token.map(|t| resolve(t, TypeHint::Document(aliases))),
        title: property.business_name.clone(),
        description: property.description.clone(),
        required: property.required,
        unique: property.unique,
        primary_key: property.primary_key,
        classification: property.classification.clone(),
        tags: property.tags.clone(),
        examples: property.examples.clone(),
        quality: property.quality.iter().map(import_quality).collect(),
        ..Default::default()
    };

    if let Some(options) = &property.logical_type_options {
        field.max_length = options.max_length;
        field.precision = options.precision;
        field.scale = options.scale;
        let ext = &mut field.extensions;
        ext.insert_opt(PROPERTY_MIN_LENGTH, options.min_length);
        ext.insert_opt(PROPERTY_PATTERN, options.pattern.clone());
        ext.insert_opt(PROPERTY_FORMAT, options.format.clone());
        for (key, value) in &options.extra {
            ext.insert(key.clone(), value.clone());
        }
    }

    let ext = &mut field.extensions;
    ext.insert_opt(PROPERTY_CRITICAL_DATA_ELEMENT, property.critical_data_element);
    ext.insert_opt(PROPERTY_ENCRYPTED_NAME, property.encrypted_name.clone());
    ext.insert_opt(PROPERTY_PARTITIONED, property.partitioned);
    ext.insert_opt(PROPERTY_PARTITION_KEY_POSITION, property.partition_key_position);
    ext.insert_opt(PROPERTY_PRIMARY_KEY_POSITION, property.primary_key_position);
    for custom in &property.custom_properties {
        ext.insert(custom.property.clone(), custom.value.clone());
    }
    for (key, value) in &property.extra {
        ext.insert(key.clone(), value.clone());
    }
    if let Some(physical_type) = &property.physical_type {
        ext.set_physical_type(dialect, physical_type.clone());
    }

    field
}

/// Convert an ODCS quality rule, renaming the inclusive comparisons and
/// keeping ODCS-only attributes in the extension map.
pub(crate) fn import_quality(rule: &DataQuality) -> Quality {
    let mut quality = Quality {
        rule_type: rule.rule_type.clone(),
        description: rule.description.clone(),
        query: rule.query.clone(),
        must_be: rule.must_be.clone(),
        must_not_be: rule.must_not_be.clone(),
        must_be_greater_than: rule.must_be_greater_than.clone(),
        must_be_greater_than_or_equal_to: rule.must_be_greater_or_equal_to.clone(),
        must_be_less_than: rule.must_be_less_than.clone(),
        must_be_less_than_or_equal_to: rule.must_be_less_or_equal_to.clone(),
        must_be_between: rule.must_be_between.clone(),
        must_not_be_between: rule.must_not_be_between.clone(),
        engine: rule.engine.clone(),
        implementation: rule.implementation.clone(),
        ..Default::default()
    };

    let ext = &mut quality.extensions;
    ext.insert_opt("businessImpact", rule.business_impact.clone());
    ext.insert_opt("dimension", rule.dimension.clone());
    ext.insert_opt("rule", rule.rule.clone());
    ext.insert_opt("schedule", rule.schedule.clone());
    ext.insert_opt("scheduler", rule.scheduler.clone());
    ext.insert_opt("severity", rule.severity.clone());
    ext.insert_opt("method", rule.method.clone());
    if !rule.custom_properties.is_empty() {
        let properties: Vec<Value> = rule
            .custom_properties
            .iter()
            .map(|p| serde_json::json!({ "property": p.property, "value": p.value }))
            .collect();
        ext.insert("customProperties", properties);
    }
    for (key, value) in &rule.extra {
        ext.insert(key.clone(), value.clone());
    }
    quality
}

/// Render a scalar as text; strings are used verbatim.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
