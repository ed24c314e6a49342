//! Open Data Contract Standard (ODCS) v3 document types

pub mod contract;
pub mod schema;
pub mod supporting;

pub use contract::{ODCS_API_VERSION, ODCS_STATUSES, OpenDataContractStandard};
pub use schema::{LogicalTypeOptions, SchemaObject, SchemaProperty};
pub use supporting::{
    CustomProperty, DataQuality, Description, Price, Role, Server, ServiceLevelAgreementProperty,
    Support,
};
