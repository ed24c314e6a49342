//! ODCS (Open Data Contract Standard) v3 exporter
//!
//! Projects the data contract hub document onto an ODCS document. Every copy
//! is guarded: an attribute absent on the source stays absent on the target.

use super::ExportError;
use crate::config::ConverterConfig;
use crate::import::odcs::{
    INFO_DATA_PRODUCT, INFO_DOMAIN, INFO_TENANT, MODEL_PHYSICAL_NAME,
    PROPERTY_CRITICAL_DATA_ELEMENT, PROPERTY_ENCRYPTED_NAME, PROPERTY_FORMAT, PROPERTY_MIN_LENGTH,
    PROPERTY_PARTITION_KEY_POSITION, PROPERTY_PARTITIONED, PROPERTY_PATTERN,
    PROPERTY_PRIMARY_KEY_POSITION, QUALITY_EXTENSION_KEYS, SLA_AVAILABILITY, SLA_RETENTION,
};
use crate::models::odcs::{
    CustomProperty, DataQuality, Description, LogicalTypeOptions, ODCS_API_VERSION,
    ODCS_STATUSES, OpenDataContractStandard, Price, Role, SchemaObject, SchemaProperty,
    ServiceLevelAgreementProperty, Support,
};
use crate::models::odcs::supporting::Server as OdcsServer;
use crate::models::{
    DataContractSpecification, Extensions, Field, Model, Quality, Server, ServiceLevel,
};
use crate::types::{CanonicalType, GENERIC_PHYSICAL_TYPE_KEY};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_PERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)([A-Za-z]+)$").expect("Invalid regex"));
static RE_BILLING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)(?:\s+([^\s/]+))?(?:\s*/\s*(.+))?$").expect("Invalid regex")
});

/// Status written when the source status is missing or not an ODCS status.
pub const DEFAULT_STATUS: &str = "draft";

/// Normalize a contract status to one of [`ODCS_STATUSES`].
///
/// ```rust
/// use data_contract_sdk::export::odcs::normalize_status;
///
/// assert_eq!(normalize_status(Some("ACTIVE")), "active");
/// assert_eq!(normalize_status(Some("bogus")), "draft");
/// assert_eq!(normalize_status(None), "draft");
/// ```
pub fn normalize_status(status: Option<&str>) -> String {
    status
        .map(|s| s.trim().to_lowercase())
        .filter(|s| ODCS_STATUSES.contains(&s.as_str()))
        .unwrap_or_else(|| DEFAULT_STATUS.to_string())
}

/// ODCS logical type for a canonical type.
///
/// `variant` and `null` have no ODCS logical type.
pub fn logical_type(canonical: CanonicalType) -> Option<&'static str> {
    match canonical {
        CanonicalType::String => Some("string"),
        CanonicalType::Integer | CanonicalType::Long => Some("integer"),
        CanonicalType::Float | CanonicalType::Decimal => Some("number"),
        CanonicalType::Boolean => Some("boolean"),
        CanonicalType::Date | CanonicalType::TimestampTz | CanonicalType::TimestampNtz => {
            Some("date")
        }
        CanonicalType::Bytes | CanonicalType::Array => Some("array"),
        CanonicalType::Object => Some("object"),
        CanonicalType::Variant | CanonicalType::Null => None,
    }
}

/// ODCS v3 exporter.
///
/// # Example
///
/// ```rust
/// use data_contract_sdk::export::OdcsExporter;
/// use data_contract_sdk::models::{DataContractSpecification, Field, Model};
/// use data_contract_sdk::types::CanonicalType;
///
/// let mut contract = DataContractSpecification::new("orders");
/// contract.info.title = "Orders".to_string();
/// contract.info.status = Some("Active".to_string());
/// contract.models.insert(
///     "orders".to_string(),
///     Model::table().with_field("id", Field::new(CanonicalType::Long)),
/// );
///
/// let odcs = OdcsExporter::new().export(&contract);
/// assert_eq!(odcs.status, "active");
/// assert_eq!(odcs.schema[0].properties[0].logical_type.as_deref(), Some("integer"));
/// ```
#[derive(Debug, Clone)]
pub struct OdcsExporter {
    api_version: String,
}

impl Default for OdcsExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl OdcsExporter {
    pub fn new() -> Self {
        Self {
            api_version: ODCS_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new().with_api_version(config.export.odcs_api_version.clone())
    }

    /// Export to YAML text.
    pub fn export_yaml(&self, contract: &DataContractSpecification) -> Result<String, ExportError> {
        self.export(contract).to_yaml()
    }

    /// Project a contract onto an ODCS document.
    pub fn export(&self, contract: &DataContractSpecification) -> OpenDataContractStandard {
        let info = &contract.info;
        let mut odcs = OpenDataContractStandard::new(contract.id.clone(), info.version.clone());
        odcs.api_version = self.api_version.clone();
        odcs.name = Some(info.title.clone());
        odcs.status = normalize_status(info.status.as_deref());
        odcs.description = export_description(contract);
        odcs.price = contract
            .terms
            .as_ref()
            .and_then(|t| t.billing.as_deref())
            .and_then(parse_billing);
        odcs.tags = contract.tags.clone();

        odcs.schema = contract
            .models
            .iter()
            .map(|(name, model)| export_schema(name, model))
            .collect();
        if let Some(levels) = &contract.servicelevels {
            odcs.sla_properties = export_sla(levels);
        }
        odcs.support = export_support(contract);
        odcs.servers = contract
            .servers
            .iter()
            .map(|(name, server)| export_server(name, server))
            .collect();

        if let Some(owner) = &info.owner {
            odcs.custom_properties
                .push(CustomProperty::new("owner", owner.clone()));
        }
        for (key, value) in &info.extensions {
            match key.as_str() {
                INFO_DOMAIN => odcs.domain = value_as_string(value),
                INFO_DATA_PRODUCT => odcs.data_product = value_as_string(value),
                INFO_TENANT => odcs.tenant = value_as_string(value),
                _ => odcs
                    .custom_properties
                    .push(CustomProperty::new(key.clone(), value.clone())),
            }
        }

        tracing::info!(
            "Exported contract '{}' to ODCS {} with {} schema object(s)",
            odcs.id,
            odcs.api_version,
            odcs.schema.len()
        );
        odcs
    }
}

fn export_description(contract: &DataContractSpecification) -> Option<Description> {
    let trimmed = |s: &Option<String>| s.as_deref().map(|v| v.trim().to_string());
    let mut description = Description::default();
    if let Some(terms) = &contract.terms {
        description.purpose = trimmed(&terms.description);
        description.usage = trimmed(&terms.usage);
        description.limitations = trimmed(&terms.limitations);
        for (key, value) in &terms.extensions {
            description.extra.insert(key.clone(), value.clone());
        }
    }
    if description.purpose.is_none() {
        description.purpose = trimmed(&contract.info.description);
    }
    (!description.is_empty()).then_some(description)
}

/// Price from a billing text of the form `<amount> [<currency>] [/ <unit>]`.
fn parse_billing(billing: &str) -> Option<Price> {
    let caps = RE_BILLING.captures(billing.trim())?;
    let amount = caps.get(1)?.as_str();
    Some(Price {
        price_amount: Some(number_value(amount)?),
        price_currency: caps.get(2).map(|m| m.as_str().to_string()),
        price_unit: caps.get(3).map(|m| m.as_str().trim().to_string()),
    })
}

fn number_value(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn export_sla(levels: &ServiceLevel) -> Vec<ServiceLevelAgreementProperty> {
    let mut properties = Vec::new();
    if let Some(description) = levels
        .availability
        .as_ref()
        .and_then(|a| a.description.clone())
    {
        properties.push(ServiceLevelAgreementProperty::new(
            SLA_AVAILABILITY,
            description,
        ));
    }
    if let Some(retention) = &levels.retention
        && let Some(period) = &retention.period
    {
        let mut property = match RE_PERIOD.captures(period.trim()) {
            Some(caps) => {
                let value = caps.get(1).and_then(|m| number_value(m.as_str()));
                let unit = caps.get(2).map(|m| m.as_str());
                match (value, unit) {
                    (Some(value), Some(unit)) => {
                        ServiceLevelAgreementProperty::new(SLA_RETENTION, value).with_unit(unit)
                    }
                    _ => ServiceLevelAgreementProperty::new(SLA_RETENTION, period.clone()),
                }
            }
            None => ServiceLevelAgreementProperty::new(SLA_RETENTION, period.clone()),
        };
        property.element = retention.timestamp_field.clone();
        properties.push(property);
    }
    properties
}

fn export_support(contract: &DataContractSpecification) -> Vec<Support> {
    let Some(contact) = &contract.info.contact else {
        return Vec::new();
    };
    let mut support = Vec::new();
    if let Some(email) = &contact.email {
        support.push(Support::new("email", format!("mailto:{}", email)));
    }
    if let Some(url) = &contact.url {
        support.push(Support::new("other", url.clone()));
    }
    support
}

fn export_server(name: &str, server: &Server) -> OdcsServer {
    OdcsServer {
        server: Some(name.to_string()),
        server_type: server.server_type.clone().unwrap_or_default(),
        description: server.description.clone(),
        environment: server.environment.clone(),
        account: server.account.clone(),
        host: server.host.clone(),
        port: server.port,
        database: server.database.clone(),
        schema: server.schema.clone(),
        catalog: server.catalog.clone(),
        project: server.project.clone(),
        dataset: server.dataset.clone(),
        location: server.location.clone(),
        path: server.path.clone(),
        format: server.format.clone(),
        delimiter: server.delimiter.clone(),
        endpoint_url: server.endpoint_url.clone(),
        topic: server.topic.clone(),
        http_path: server.http_path.clone(),
        driver: server.driver.clone(),
        token: server.token.clone(),
        roles: server
            .roles
            .iter()
            .map(|role| Role {
                role: role.name.clone(),
                description: role.description.clone(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn export_schema(name: &str, model: &Model) -> SchemaObject {
    let mut extensions = model.extensions.clone();
    let physical_name = extensions
        .remove(MODEL_PHYSICAL_NAME)
        .and_then(|v| value_as_string(&v))
        .unwrap_or_else(|| name.to_string());

    let composite_key = model.has_composite_primary_key();
    let mut key_position = 0;
    let properties = model
        .fields
        .iter()
        .map(|(field_name, field)| {
            let position = (composite_key && field.is_primary_key()).then(|| {
                key_position += 1;
                key_position
            });
            export_property(field_name, field, position)
        })
        .collect();

    SchemaObject {
        name: name.to_string(),
        physical_name: Some(physical_name),
        logical_type: Some("object".to_string()),
        physical_type: model.model_type.clone(),
        business_name: model.title.clone(),
        description: model.description.clone(),
        tags: model.tags.clone(),
        properties,
        quality: model.quality.iter().map(export_quality).collect(),
        custom_properties: into_custom_properties(extensions),
        ..Default::default()
    }
}

/// Build one property. `key_position` is the field's 1-based position within
/// a composite primary key.
fn export_property(name: &str, field: &Field, key_position: Option<i64>) -> SchemaProperty {
    let mut extensions = field.extensions.clone();
    let physical_type = match field.extensions.physical_type() {
        Some((key, value)) => {
            let value = value.to_string();
            if key == GENERIC_PHYSICAL_TYPE_KEY {
                extensions.remove(key);
            }
            Some(value)
        }
        None => field.field_type.map(|t| t.as_str().to_string()),
    };

    let options = LogicalTypeOptions {
        max_length: field.max_length,
        precision: field.precision,
        scale: field.scale,
        min_length: extensions.remove(PROPERTY_MIN_LENGTH).and_then(|v| v.as_u64()),
        pattern: extensions
            .remove(PROPERTY_PATTERN)
            .and_then(|v| value_as_string(&v)),
        format: extensions
            .remove(PROPERTY_FORMAT)
            .and_then(|v| value_as_string(&v)),
        ..Default::default()
    };

    let primary_key_position = extensions
        .remove(PROPERTY_PRIMARY_KEY_POSITION)
        .and_then(|v| v.as_i64())
        .or(key_position);

    SchemaProperty {
        name: name.to_string(),
        business_name: field.title.clone(),
        description: field.description.clone(),
        logical_type: field.field_type.and_then(logical_type).map(str::to_string),
        logical_type_options: (!options.is_empty()).then_some(options),
        physical_type,
        required: field.required,
        unique: field.unique,
        primary_key: field.primary_key,
        primary_key_position,
        critical_data_element: extensions
            .remove(PROPERTY_CRITICAL_DATA_ELEMENT)
            .and_then(|v| v.as_bool()),
        encrypted_name: extensions
            .remove(PROPERTY_ENCRYPTED_NAME)
            .and_then(|v| value_as_string(&v)),
        partitioned: extensions
            .remove(PROPERTY_PARTITIONED)
            .and_then(|v| v.as_bool()),
        partition_key_position: extensions
            .remove(PROPERTY_PARTITION_KEY_POSITION)
            .and_then(|v| v.as_i64()),
        classification: field.classification.clone(),
        tags: field.tags.clone(),
        examples: field.examples.clone(),
        quality: field.quality.iter().map(export_quality).collect(),
        custom_properties: into_custom_properties(extensions),
        ..Default::default()
    }
}

/// Convert a quality rule. The inclusive comparisons are renamed and the
/// SQL dialect, which ODCS v3 has no slot for, is dropped.
fn export_quality(quality: &Quality) -> DataQuality {
    let mut extensions = quality.extensions.clone();
    let mut take_string = |key: &str| extensions.remove(key).and_then(|v| value_as_string(&v));

    let mut rule = DataQuality {
        rule_type: quality.rule_type.clone(),
        description: quality.description.clone(),
        query: quality.query.clone(),
        must_be: quality.must_be.clone(),
        must_not_be: quality.must_not_be.clone(),
        must_be_greater_than: quality.must_be_greater_than.clone(),
        must_be_greater_or_equal_to: quality.must_be_greater_than_or_equal_to.clone(),
        must_be_less_than: quality.must_be_less_than.clone(),
        must_be_less_or_equal_to: quality.must_be_less_than_or_equal_to.clone(),
        must_be_between: quality.must_be_between.clone(),
        must_not_be_between: quality.must_not_be_between.clone(),
        engine: quality.engine.clone(),
        implementation: quality.implementation.clone(),
        business_impact: take_string(QUALITY_EXTENSION_KEYS[0]),
        dimension: take_string(QUALITY_EXTENSION_KEYS[1]),
        rule: take_string(QUALITY_EXTENSION_KEYS[2]),
        schedule: take_string(QUALITY_EXTENSION_KEYS[3]),
        scheduler: take_string(QUALITY_EXTENSION_KEYS[4]),
        severity: take_string(QUALITY_EXTENSION_KEYS[5]),
        method: take_string(QUALITY_EXTENSION_KEYS[6]),
        ..Default::default()
    };

    if let Some(Value::Array(items)) = extensions.remove(QUALITY_EXTENSION_KEYS[7]) {
        rule.custom_properties = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<CustomProperty>(item).ok())
            .collect();
    }
    if quality.dialect.is_some() {
        tracing::debug!("Quality rule dialect has no ODCS v3 equivalent; dropped");
    }
    rule.extra = extensions.into_iter().collect();
    rule
}

fn into_custom_properties(extensions: Extensions) -> Vec<CustomProperty> {
    extensions
        .into_iter()
        .map(|(key, value)| CustomProperty::new(key, value))
        .collect()
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, Contact, Retention, Terms};
    use crate::types::Dialect;

    #[test]
    fn test_status_normalization() {
        assert_eq!(normalize_status(Some("ACTIVE")), "active");
        assert_eq!(normalize_status(Some(" Retired ")), "retired");
        assert_eq!(normalize_status(Some("bogus")), "draft");
        assert_eq!(normalize_status(None), "draft");
    }

    #[test]
    fn test_logical_type_mapping() {
        assert_eq!(logical_type(CanonicalType::Long), Some("integer"));
        assert_eq!(logical_type(CanonicalType::Decimal), Some("number"));
        assert_eq!(logical_type(CanonicalType::TimestampNtz), Some("date"));
        assert_eq!(logical_type(CanonicalType::Bytes), Some("array"));
        assert_eq!(logical_type(CanonicalType::Variant), None);
    }

    #[test]
    fn test_absent_stays_absent() {
        let contract = DataContractSpecification::new("empty");
        let odcs = OdcsExporter::new().export(&contract);
        assert!(odcs.description.is_none());
        assert!(odcs.sla_properties.is_empty());
        assert!(odcs.support.is_empty());
        assert!(odcs.servers.is_empty());
        assert!(odcs.custom_properties.is_empty());
        assert!(odcs.price.is_none());
        assert_eq!(odcs.status, "draft");
    }

    #[test]
    fn test_description_is_trimmed() {
        let mut contract = DataContractSpecification::new("c");
        contract.terms = Some(Terms {
            usage: Some("  internal use  \n".to_string()),
            limitations: Some("\tnone".to_string()),
            ..Default::default()
        });
        contract.info.description = Some(" Orders ".to_string());
        let description = OdcsExporter::new().export(&contract).description.unwrap();
        assert_eq!(description.usage.as_deref(), Some("internal use"));
        assert_eq!(description.limitations.as_deref(), Some("none"));
        assert_eq!(description.purpose.as_deref(), Some("Orders"));
    }

    #[test]
    fn test_sla_properties() {
        let mut contract = DataContractSpecification::new("c");
        contract.servicelevels = Some(ServiceLevel {
            availability: Some(Availability {
                description: Some("99.9%".to_string()),
                percentage: None,
            }),
            retention: Some(Retention {
                period: Some("3y".to_string()),
                timestamp_field: Some("orders.created_at".to_string()),
                ..Default::default()
            }),
        });
        let sla = OdcsExporter::new().export(&contract).sla_properties;
        assert_eq!(sla[0].property, "generalAvailability");
        assert_eq!(sla[0].value, Value::from("99.9%"));
        assert_eq!(sla[1].property, "retention");
        assert_eq!(sla[1].value, Value::from(3));
        assert_eq!(sla[1].unit.as_deref(), Some("y"));
        assert_eq!(sla[1].element.as_deref(), Some("orders.created_at"));
    }

    #[test]
    fn test_retention_without_unit_stays_text() {
        let levels = ServiceLevel {
            availability: None,
            retention: Some(Retention {
                period: Some("one year".to_string()),
                ..Default::default()
            }),
        };
        let sla = export_sla(&levels);
        assert_eq!(sla.len(), 1);
        assert_eq!(sla[0].value, Value::from("one year"));
        assert!(sla[0].unit.is_none());
    }

    #[test]
    fn test_support_channels() {
        let mut contract = DataContractSpecification::new("c");
        contract.info.contact = Some(Contact {
            name: None,
            email: Some("team@example.com".to_string()),
            url: Some("https://example.com".to_string()),
        });
        let support = OdcsExporter::new().export(&contract).support;
        assert_eq!(support[0].channel, "email");
        assert_eq!(support[0].url.as_deref(), Some("mailto:team@example.com"));
        assert_eq!(support[1].channel, "other");
    }

    #[test]
    fn test_custom_properties_and_first_class_info() {
        let mut contract = DataContractSpecification::new("c");
        contract.info.owner = Some("checkout-team".to_string());
        contract.info.extensions.insert("domain", "sales");
        contract.info.extensions.insert("slackChannel", "#orders");
        let odcs = OdcsExporter::new().export(&contract);
        assert_eq!(odcs.domain.as_deref(), Some("sales"));
        assert_eq!(odcs.custom_properties[0].property, "owner");
        assert_eq!(odcs.custom_properties[1].property, "slackChannel");
        assert_eq!(odcs.custom_properties.len(), 2);
    }

    #[test]
    fn test_price_from_billing() {
        let price = parse_billing("9.95 USD / megabyte").unwrap();
        assert_eq!(price.price_amount, Some(Value::from(9.95)));
        assert_eq!(price.price_currency.as_deref(), Some("USD"));
        assert_eq!(price.price_unit.as_deref(), Some("megabyte"));
        assert!(parse_billing("free for internal teams").is_none());
    }

    #[test]
    fn test_property_physical_type_and_composite_key() {
        let mut a = Field::new(CanonicalType::Integer);
        a.mark_primary_key();
        a.extensions.set_physical_type(Dialect::Postgres, "int4");
        let mut b = Field::new(CanonicalType::Integer);
        b.mark_primary_key();
        b.extensions.set_physical_type(Dialect::Generic, "int");
        let c = Field::new(CanonicalType::Variant);
        let model = Model::table()
            .with_field("a", a)
            .with_field("b", b)
            .with_field("c", c);

        let schema = export_schema("t", &model);
        let props = &schema.properties;
        assert_eq!(props[0].physical_type.as_deref(), Some("int4"));
        assert_eq!(props[0].primary_key_position, Some(1));
        assert_eq!(
            props[0].custom_property("postgresType"),
            Some(&Value::from("int4"))
        );
        assert_eq!(props[1].physical_type.as_deref(), Some("int"));
        assert_eq!(props[1].primary_key_position, Some(2));
        assert!(props[1].custom_properties.is_empty());
        assert_eq!(props[2].physical_type.as_deref(), Some("variant"));
        assert_eq!(props[2].logical_type, None);
        assert_eq!(schema.physical_type.as_deref(), Some("table"));
        assert_eq!(schema.logical_type.as_deref(), Some("object"));
    }

    #[test]
    fn test_quality_rename() {
        let mut quality = Quality::new("sql").with_query("SELECT COUNT(*) FROM t");
        quality.dialect = Some("postgres".to_string());
        quality.must_be_greater_than_or_equal_to = Some(Value::from(1));
        quality.must_be_less_than_or_equal_to = Some(Value::from(100));
        quality.extensions.insert("severity", "error");
        quality.extensions.insert("owner", "dq-team");

        let rule = export_quality(&quality);
        assert_eq!(rule.must_be_greater_or_equal_to, Some(Value::from(1)));
        assert_eq!(rule.must_be_less_or_equal_to, Some(Value::from(100)));
        assert_eq!(rule.severity.as_deref(), Some("error"));
        assert_eq!(rule.extra.get("owner"), Some(&Value::from("dq-team")));
        assert!(!rule.extra.contains_key("dialect"));
    }
}
