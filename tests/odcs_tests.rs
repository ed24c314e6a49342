//! ODCS import and export tests

use data_contract_sdk::export::OdcsExporter;
use data_contract_sdk::import::{ImportError, OdcsImporter};
use data_contract_sdk::models::odcs::OpenDataContractStandard;
use data_contract_sdk::types::{CanonicalType, Dialect};
use serde_json::json;

const FULL_EXAMPLE: &str = r##"
apiVersion: v3.0.1
kind: DataContract
id: 53581432-6c55-4ba2-a65f-72344a91553a
name: Orders Latest
version: 2.0.0
status: active
domain: checkout
dataProduct: orders
tenant: company-A
contractCreatedTs: "2024-05-01T10:00:00Z"
description:
  purpose: All orders of the webshop.
  usage: Analytics and reporting.
  limitations: Not suitable for real-time use.
price:
  priceAmount: 9.95
  priceCurrency: USD
  priceUnit: megabyte
tags:
  - orders
customProperties:
  - property: owner
    value: checkout-team
  - property: dc_mapping_amount_type
    value: decimal
  - property: slackChannel
    value: "#checkout"
servers:
  - server: production
    type: postgres
    host: db.example.com
    port: 5432
    database: shop
    schema: public
    roles:
      - role: analyst
        description: Read access
  - server: lake
    type: azure
    location: abfss://raw@lakeaccount.dfs.core.windows.net/orders/*.parquet
    format: parquet
support:
  - channel: email
    url: mailto:checkout@example.com
  - channel: other
    url: https://wiki.example.com/checkout
slaProperties:
  - property: generalAvailability
    value: "2022-05-12T09:30:10-08:00"
  - property: retention
    value: 1
    unit: y
    element: orders.order_timestamp
schema:
  - name: orders
    physicalName: orders_v2
    physicalType: table
    description: One record per order.
    customProperties:
      - property: partitionedBy
        value: order_date
    properties:
      - name: order_id
        physicalType: uuid
        logicalType: string
        primaryKey: true
        primaryKeyPosition: 1
        required: true
        classification: internal
        criticalDataElement: true
      - name: line_no
        physicalType: integer
        primaryKey: true
        primaryKeyPosition: 2
      - name: amount
        physicalType: amount_type
        logicalTypeOptions:
          precision: 10
          scale: 2
        quality:
          - type: sql
            query: SELECT COUNT(*) FROM orders WHERE amount < 0
            mustBeLessOrEqualTo: 0
            dimension: accuracy
            severity: error
      - name: note
        logicalType: string
        logicalTypeOptions:
          maxLength: 200
          pattern: "^[A-Z]"
        customProperties:
          - property: pii
            value: false
"##;

mod import {
    use super::*;

    #[test]
    fn test_info_and_terms() {
        let contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
        assert_eq!(contract.id, "53581432-6c55-4ba2-a65f-72344a91553a");
        assert_eq!(contract.info.title, "Orders Latest");
        assert_eq!(contract.info.version, "2.0.0");
        assert_eq!(contract.info.owner.as_deref(), Some("checkout-team"));
        assert_eq!(contract.info.extensions.get_str("dataProduct"), Some("orders"));
        assert_eq!(contract.info.extensions.get_str("tenant"), Some("company-A"));
        assert_eq!(contract.info.extensions.get_str("slackChannel"), Some("#checkout"));

        let terms = contract.terms.as_ref().unwrap();
        assert_eq!(terms.usage.as_deref(), Some("Analytics and reporting."));
        assert_eq!(terms.billing.as_deref(), Some("9.95 USD / megabyte"));
        assert_eq!(contract.tags, vec!["orders"]);
    }

    #[test]
    fn test_unmodelled_attributes_survive_export() {
        let contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
        assert_eq!(
            contract.info.extensions.get_str("contractCreatedTs"),
            Some("2024-05-01T10:00:00Z")
        );

        let odcs = OdcsExporter::new().export(&contract);
        assert_eq!(
            odcs.custom_property("contractCreatedTs"),
            Some(&json!("2024-05-01T10:00:00Z"))
        );
    }

    #[test]
    fn test_servers() {
        let contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
        let production = &contract.servers["production"];
        assert_eq!(production.server_type.as_deref(), Some("postgres"));
        assert_eq!(production.port, Some(5432));
        assert_eq!(production.roles[0].name, "analyst");
        assert!(production.storage_account.is_none());

        let lake = &contract.servers["lake"];
        assert_eq!(lake.storage_account.as_deref(), Some("lakeaccount"));
        assert_eq!(lake.format.as_deref(), Some("parquet"));
    }

    #[test]
    fn test_service_levels_and_contact() {
        let contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
        let levels = contract.servicelevels.as_ref().unwrap();
        let retention = levels.retention.as_ref().unwrap();
        assert_eq!(retention.period.as_deref(), Some("1y"));
        assert_eq!(retention.timestamp_field.as_deref(), Some("orders.order_timestamp"));

        let contact = contract.info.contact.as_ref().unwrap();
        assert_eq!(contact.email.as_deref(), Some("checkout@example.com"));
        assert_eq!(contact.url.as_deref(), Some("https://wiki.example.com/checkout"));
    }

    #[test]
    fn test_fields() {
        let contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
        let orders = &contract.models["orders"];
        assert_eq!(orders.model_type.as_deref(), Some("table"));
        assert_eq!(orders.extensions.get_str("physicalName"), Some("orders_v2"));
        assert_eq!(orders.extensions.get_str("partitionedBy"), Some("order_date"));

        let order_id = &orders.fields["order_id"];
        assert_eq!(order_id.field_type, Some(CanonicalType::String));
        assert_eq!(order_id.extensions.get_str("postgresType"), Some("uuid"));
        assert_eq!(order_id.extensions.get_bool("criticalDataElement"), Some(true));
        assert_eq!(order_id.classification.as_deref(), Some("internal"));

        let line_no = &orders.fields["line_no"];
        assert_eq!(line_no.required, Some(true));
        assert_eq!(line_no.unique, Some(true));

        let amount = &orders.fields["amount"];
        assert_eq!(amount.field_type, Some(CanonicalType::Decimal));
        assert_eq!((amount.precision, amount.scale), (Some(10), Some(2)));
        let rule = &amount.quality[0];
        assert_eq!(rule.must_be_less_than_or_equal_to, Some(json!(0)));
        assert_eq!(rule.extensions.get_str("dimension"), Some("accuracy"));

        let note = &orders.fields["note"];
        assert_eq!(note.field_type, Some(CanonicalType::String));
        assert_eq!(note.max_length, Some(200));
        assert_eq!(note.extensions.get_bool("pii"), Some(false));
        assert!(!note.extensions.contains_key("postgresType"));
    }

    #[test]
    fn test_explicit_dialect_overrides_server() {
        let contract = OdcsImporter::new()
            .with_dialect(Dialect::Snowflake)
            .import_str(FULL_EXAMPLE)
            .unwrap();
        let order_id = &contract.models["orders"].fields["order_id"];
        assert_eq!(order_id.extensions.get_str("snowflakeType"), Some("uuid"));
        assert!(!order_id.extensions.contains_key("postgresType"));
    }

    #[test]
    fn test_unnamed_server_skipped() {
        let yaml = "id: x\nversion: '1'\nservers:\n  - type: s3\n    location: s3://bucket/*.json\n";
        let contract = OdcsImporter::new().import_str(yaml).unwrap();
        assert!(contract.servers.is_empty());
    }

    #[test]
    fn test_json_input() {
        let json = r#"{"id": "j", "version": "1", "name": "Json", "status": "draft"}"#;
        let contract = OdcsImporter::new().import_str(json).unwrap();
        assert_eq!(contract.info.title, "Json");
    }

    #[test]
    fn test_parse_error() {
        let err = OdcsImporter::new().import_str("id: [").unwrap_err();
        assert!(matches!(err, ImportError::Parse { stage: "odcs", .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}

mod export {
    use super::*;

    #[test]
    fn test_export_yaml() {
        let contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
        let yaml = OdcsExporter::new().export_yaml(&contract).unwrap();
        let odcs = OpenDataContractStandard::from_yaml(&yaml, "exported").unwrap();
        assert_eq!(odcs.api_version, "v3.0.1");
        assert_eq!(odcs.kind, "DataContract");
        assert_eq!(odcs.schema[0].physical_name.as_deref(), Some("orders_v2"));
    }

    #[test]
    fn test_status_normalization() {
        for (input, expected) in [
            (Some("ACTIVE"), "active"),
            (Some("Deprecated"), "deprecated"),
            (Some("bogus"), "draft"),
            (None, "draft"),
        ] {
            let mut contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
            contract.info.status = input.map(str::to_string);
            assert_eq!(OdcsExporter::new().export(&contract).status, expected);
        }
    }

    #[test]
    fn test_api_version_override() {
        let contract = OdcsImporter::new().import_str(FULL_EXAMPLE).unwrap();
        let odcs = OdcsExporter::new()
            .with_api_version("v3.1.0")
            .export(&contract);
        assert_eq!(odcs.api_version, "v3.1.0");
    }
}
