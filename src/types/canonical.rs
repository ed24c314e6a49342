//! Canonical logical types
//!
//! The closed set of types every physical type token is reduced to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical logical data type shared by every representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalType {
    String,
    Integer,
    Long,
    Float,
    Decimal,
    Boolean,
    Date,
    TimestampTz,
    TimestampNtz,
    Bytes,
    Array,
    Object,
    Variant,
    Null,
}

impl CanonicalType {
    /// Every canonical type, in declaration order.
    pub const ALL: [CanonicalType; 14] = [
        CanonicalType::String,
        CanonicalType::Integer,
        CanonicalType::Long,
        CanonicalType::Float,
        CanonicalType::Decimal,
        CanonicalType::Boolean,
        CanonicalType::Date,
        CanonicalType::TimestampTz,
        CanonicalType::TimestampNtz,
        CanonicalType::Bytes,
        CanonicalType::Array,
        CanonicalType::Object,
        CanonicalType::Variant,
        CanonicalType::Null,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::String => "string",
            CanonicalType::Integer => "integer",
            CanonicalType::Long => "long",
            CanonicalType::Float => "float",
            CanonicalType::Decimal => "decimal",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Date => "date",
            CanonicalType::TimestampTz => "timestamp_tz",
            CanonicalType::TimestampNtz => "timestamp_ntz",
            CanonicalType::Bytes => "bytes",
            CanonicalType::Array => "array",
            CanonicalType::Object => "object",
            CanonicalType::Variant => "variant",
            CanonicalType::Null => "null",
        }
    }

    /// Whether a single size parameter on this type means a maximum length.
    pub fn is_length_bounded(&self) -> bool {
        matches!(self, CanonicalType::String | CanonicalType::Bytes)
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        CanonicalType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown canonical type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse_agree() {
        for t in CanonicalType::ALL {
            assert_eq!(t.to_string().parse::<CanonicalType>().unwrap(), t);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&CanonicalType::TimestampTz).unwrap();
        assert_eq!(json, "\"timestamp_tz\"");
        let back: CanonicalType = serde_json::from_str("\"timestamp_ntz\"").unwrap();
        assert_eq!(back, CanonicalType::TimestampNtz);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("varchar".parse::<CanonicalType>().is_err());
    }
}
