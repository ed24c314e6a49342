//! Data models
//!
//! The data contract hub document and its parts, plus the ODCS document
//! types in [`odcs`].

pub mod contract;
pub mod extensions;
pub mod field;
pub mod model;
pub mod odcs;
pub mod quality;
pub mod server;

pub use contract::{
    Availability, Contact, DataContractSpecification, Info, Retention, SPECIFICATION_VERSION,
    ServiceLevel, Terms,
};
pub use extensions::Extensions;
pub use field::Field;
pub use model::Model;
pub use quality::Quality;
pub use server::{Server, ServerRole};
