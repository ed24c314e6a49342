//! Round trips through the hub document

use data_contract_sdk::export::OdcsExporter;
use data_contract_sdk::import::{OdcsImporter, SqlImporter};
use data_contract_sdk::models::odcs::OpenDataContractStandard;
use data_contract_sdk::types::Dialect;

const ODCS: &str = r#"
apiVersion: v3.0.1
kind: DataContract
id: orders-contract
name: Orders
version: 1.2.0
status: active
description:
  purpose: Orders placed in the webshop.
  usage: Reporting only.
servers:
  - server: warehouse
    type: snowflake
    account: acme
    database: ANALYTICS
    schema: ORDERS
support:
  - channel: email
    url: mailto:data@example.com
  - channel: other
    url: https://example.com/data
slaProperties:
  - property: generalAvailability
    value: "2023-01-01T00:00:00Z"
  - property: retention
    value: 5
    unit: y
customProperties:
  - property: owner
    value: data-team
schema:
  - name: orders
    physicalType: table
    description: Orders
    properties:
      - name: id
        physicalType: NUMBER(38,0)
        description: Order id
        primaryKey: true
        required: true
      - name: placed_at
        physicalType: TIMESTAMP_TZ
        description: Placement time
      - name: payload
        physicalType: VARIANT
"#;

fn odcs_roundtrip(yaml: &str) -> (OpenDataContractStandard, OpenDataContractStandard) {
    let original = OpenDataContractStandard::from_yaml(yaml, "original").unwrap();
    let contract = OdcsImporter::new().import(&original);
    let exported = OdcsExporter::new().export(&contract);
    (original, exported)
}

#[test]
fn test_odcs_core_fields_survive() {
    let (original, exported) = odcs_roundtrip(ODCS);
    assert_eq!(exported.id, original.id);
    assert_eq!(exported.name, original.name);
    assert_eq!(exported.version, original.version);
    assert_eq!(exported.status, original.status);
    assert_eq!(
        exported.description.as_ref().and_then(|d| d.purpose.clone()),
        original.description.as_ref().and_then(|d| d.purpose.clone())
    );
    assert_eq!(
        exported.description.as_ref().and_then(|d| d.usage.clone()),
        Some("Reporting only.".to_string())
    );
    assert_eq!(exported.custom_property("owner"), original.custom_property("owner"));
}

#[test]
fn test_odcs_schema_survives() {
    let (original, exported) = odcs_roundtrip(ODCS);
    assert_eq!(exported.schema.len(), original.schema.len());
    for (before, after) in original.schema.iter().zip(&exported.schema) {
        assert_eq!(before.name, after.name);
        assert_eq!(before.physical_type, after.physical_type);
        assert_eq!(before.description, after.description);
        for (p_before, p_after) in before.properties.iter().zip(&after.properties) {
            assert_eq!(p_before.name, p_after.name);
            assert_eq!(p_before.physical_type, p_after.physical_type);
            assert_eq!(p_before.description, p_after.description);
            assert_eq!(p_before.primary_key, p_after.primary_key);
        }
    }
}

#[test]
fn test_odcs_sla_support_and_servers_survive() {
    let (original, exported) = odcs_roundtrip(ODCS);
    assert_eq!(exported.sla_properties, original.sla_properties);

    let channels: Vec<(&str, Option<&str>)> = exported
        .support
        .iter()
        .map(|s| (s.channel.as_str(), s.url.as_deref()))
        .collect();
    assert_eq!(
        channels,
        vec![
            ("email", Some("mailto:data@example.com")),
            ("other", Some("https://example.com/data")),
        ]
    );

    let server = &exported.servers[0];
    let source = &original.servers[0];
    assert_eq!(server.server, source.server);
    assert_eq!(server.server_type, source.server_type);
    assert_eq!(server.account, source.account);
    assert_eq!(server.database, source.database);
    assert_eq!(server.schema, source.schema);
}

#[test]
fn test_physical_type_keyed_by_server_dialect() {
    let original = OpenDataContractStandard::from_yaml(ODCS, "original").unwrap();
    let contract = OdcsImporter::new().import(&original);
    let id = &contract.models["orders"].fields["id"];
    assert_eq!(id.extensions.get_str("snowflakeType"), Some("NUMBER(38,0)"));

    let exported = OdcsExporter::new().export(&contract);
    let property = &exported.schema[0].properties[0];
    assert_eq!(
        property.custom_property("snowflakeType").and_then(|v| v.as_str()),
        Some("NUMBER(38,0)")
    );
}

#[test]
fn test_postgres_ddl_to_odcs() {
    let contract = SqlImporter::new(Dialect::Postgres)
        .import("CREATE TABLE payments (id BIGINT PRIMARY KEY, amount numeric(10,2) NOT NULL);")
        .unwrap();
    let odcs = OdcsExporter::new().export(&contract);

    let schema = &odcs.schema[0];
    assert_eq!(schema.name, "payments");
    assert_eq!(schema.physical_type.as_deref(), Some("table"));

    let amount = &schema.properties[1];
    assert_eq!(amount.physical_type.as_deref(), Some("numeric(10,2)"));
    assert_eq!(amount.logical_type.as_deref(), Some("number"));
    assert_eq!(amount.required, Some(true));
    let options = amount.logical_type_options.as_ref().unwrap();
    assert_eq!((options.precision, options.scale), (Some(10), Some(2)));
    assert_eq!(
        amount.custom_property("postgresType").and_then(|v| v.as_str()),
        Some("numeric(10,2)")
    );
    assert_eq!(odcs.servers[0].server_type, "postgres");

    // and back again under the same key
    let reimported = OdcsImporter::new().import(&odcs);
    let amount = &reimported.models["payments"].fields["amount"];
    assert_eq!(amount.extensions.get_str("postgresType"), Some("numeric(10,2)"));
}

#[test]
fn test_composite_key_positions_exported() {
    let contract = SqlImporter::new(Dialect::Generic)
        .import("CREATE TABLE T (a INT, b INT, PRIMARY KEY (a, b));")
        .unwrap();
    let odcs = OdcsExporter::new().export(&contract);
    let props = &odcs.schema[0].properties;
    assert_eq!(props[0].primary_key_position, Some(1));
    assert_eq!(props[1].primary_key_position, Some(2));
    assert_eq!(props[0].physical_type.as_deref(), Some("int"));
    assert!(props[0].custom_properties.is_empty());
}

#[test]
fn test_composite_key_positions_follow_constraint_order() {
    let contract = SqlImporter::new(Dialect::Generic)
        .import("CREATE TABLE T (a INT, b INT, PRIMARY KEY (b, a));")
        .unwrap();
    let odcs = OdcsExporter::new().export(&contract);
    let props = &odcs.schema[0].properties;
    assert_eq!(props[0].name, "a");
    assert_eq!(props[0].primary_key_position, Some(2));
    assert_eq!(props[1].name, "b");
    assert_eq!(props[1].primary_key_position, Some(1));
    assert!(props.iter().all(|p| p.custom_properties.is_empty()));
}

#[test]
fn test_dcs_yaml_roundtrip() {
    let contract = OdcsImporter::new().import_str(ODCS).unwrap();
    let yaml = contract.to_yaml().unwrap();
    let parsed = data_contract_sdk::DataContractSpecification::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, contract);
}
