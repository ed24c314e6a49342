//! Type system
//!
//! - [`canonical`]: the closed set of canonical logical types
//! - [`dialect`]: the SQL dialect registry
//! - [`resolver`]: raw type token to canonical type resolution

pub mod canonical;
pub mod dialect;
pub mod resolver;

pub use canonical::CanonicalType;
pub use dialect::{Dialect, DialectInfo, GENERIC_PHYSICAL_TYPE_KEY};
pub use resolver::{TYPE_ALIAS_PREFIX, TypeAliases, TypeHint, resolve};
