//! Canonical type resolution
//!
//! Maps raw type tokens from DDL or contract documents onto [`CanonicalType`].
//! Resolution is total: unknown tokens degrade to a pass-through fallback
//! (`variant` for SQL, `object` for documents) instead of failing.

use super::canonical::CanonicalType;
use super::dialect::Dialect;
use indexmap::IndexMap;

/// Prefix marking a document-level custom property as a type alias.
pub const TYPE_ALIAS_PREFIX: &str = "dc_mapping_";

/// Source of the token being resolved.
#[derive(Debug, Clone, Copy)]
pub enum TypeHint<'a> {
    /// Column type from DDL in the given dialect
    Sql(Dialect),
    /// Type name from a contract document, with that document's aliases
    Document(&'a TypeAliases),
}

/// Per-document type aliases (`dc_mapping_<name>` custom properties).
///
/// Scoped to one import call; never shared between documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAliases {
    aliases: IndexMap<String, String>,
}

impl TypeAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` as an alias for the document type `target`.
    pub fn insert(&mut self, source: impl AsRef<str>, target: impl Into<String>) {
        self.aliases
            .insert(source.as_ref().trim().to_lowercase(), target.into());
    }

    /// Build from custom property `(name, value)` pairs, keeping only the
    /// prefixed ones with string values.
    pub fn from_properties<'p, I>(properties: I) -> Self
    where
        I: IntoIterator<Item = (&'p str, &'p serde_json::Value)>,
    {
        let mut aliases = Self::new();
        for (name, value) in properties {
            if let Some(source) = name.strip_prefix(TYPE_ALIAS_PREFIX)
                && let Some(target) = value.as_str()
            {
                aliases.insert(source, target);
            }
        }
        aliases
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.aliases
            .get(&source.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }
}

/// Exact keyword matches, checked before any prefix.
const KEYWORDS: &[(&str, CanonicalType)] = &[
    ("date", CanonicalType::Date),
    ("time", CanonicalType::String),
    ("timestamp", CanonicalType::TimestampNtz),
    ("timestamptz", CanonicalType::TimestampTz),
    ("timestamp_tz", CanonicalType::TimestampTz),
    ("timestamp_ltz", CanonicalType::TimestampTz),
    ("timestamp with time zone", CanonicalType::TimestampTz),
    ("timestamp with local time zone", CanonicalType::TimestampTz),
    ("timestampntz", CanonicalType::TimestampNtz),
    ("timestamp_ntz", CanonicalType::TimestampNtz),
    ("timestamp without time zone", CanonicalType::TimestampNtz),
    ("datetime", CanonicalType::TimestampNtz),
    ("datetime2", CanonicalType::TimestampNtz),
    ("smalldatetime", CanonicalType::TimestampNtz),
    ("datetimeoffset", CanonicalType::TimestampTz),
    ("uniqueidentifier", CanonicalType::String),
    ("uuid", CanonicalType::String),
    ("json", CanonicalType::String),
    ("jsonb", CanonicalType::String),
    ("xml", CanonicalType::String),
    ("null", CanonicalType::Null),
    ("variant", CanonicalType::Variant),
];

/// Prefix matches for parameterised types. Longer and more specific
/// prefixes come first so `bigint` never matches as `int`.
const PREFIXES: &[(&str, CanonicalType)] = &[
    ("array<", CanonicalType::Array),
    ("array", CanonicalType::Array),
    ("struct", CanonicalType::Object),
    ("map<", CanonicalType::Object),
    ("object", CanonicalType::Object),
    ("bigserial", CanonicalType::Long),
    ("bigint", CanonicalType::Long),
    ("int8", CanonicalType::Long),
    ("longtext", CanonicalType::String),
    ("longblob", CanonicalType::Bytes),
    ("long", CanonicalType::Long),
    ("mediumtext", CanonicalType::String),
    ("mediumblob", CanonicalType::Bytes),
    ("tinytext", CanonicalType::String),
    ("tinyblob", CanonicalType::Bytes),
    ("smallserial", CanonicalType::Integer),
    ("serial", CanonicalType::Integer),
    ("smallint", CanonicalType::Integer),
    ("tinyint", CanonicalType::Integer),
    ("mediumint", CanonicalType::Integer),
    ("interval", CanonicalType::String),
    ("int", CanonicalType::Integer),
    ("varbinary", CanonicalType::Bytes),
    ("binary", CanonicalType::Bytes),
    ("bytea", CanonicalType::Bytes),
    ("blob", CanonicalType::Bytes),
    ("bytes", CanonicalType::Bytes),
    ("varchar", CanonicalType::String),
    ("nvarchar", CanonicalType::String),
    ("character", CanonicalType::String),
    ("char", CanonicalType::String),
    ("nchar", CanonicalType::String),
    ("string", CanonicalType::String),
    ("ntext", CanonicalType::String),
    ("text", CanonicalType::String),
    ("clob", CanonicalType::String),
    ("number", CanonicalType::Decimal),
    ("numeric", CanonicalType::Decimal),
    ("decimal", CanonicalType::Decimal),
    ("dec(", CanonicalType::Decimal),
    ("money", CanonicalType::Decimal),
    ("smallmoney", CanonicalType::Decimal),
    ("float", CanonicalType::Float),
    ("double", CanonicalType::Float),
    ("real", CanonicalType::Float),
    ("boolean", CanonicalType::Boolean),
    ("bool", CanonicalType::Boolean),
    ("bit", CanonicalType::Boolean),
    ("timestamp with time zone", CanonicalType::TimestampTz),
    ("timestamptz", CanonicalType::TimestampTz),
    ("timestamp_tz", CanonicalType::TimestampTz),
    ("timestamp_ltz", CanonicalType::TimestampTz),
    ("timestamp_ntz", CanonicalType::TimestampNtz),
    ("timestamp", CanonicalType::TimestampNtz),
    ("datetimeoffset", CanonicalType::TimestampTz),
    ("datetime", CanonicalType::TimestampNtz),
    // after every timestamp prefix
    ("time", CanonicalType::String),
];

/// Type names of the contract document vocabulary.
const DOCUMENT_TYPES: &[(&str, CanonicalType)] = &[
    ("string", CanonicalType::String),
    ("text", CanonicalType::String),
    ("varchar", CanonicalType::String),
    ("number", CanonicalType::Decimal),
    ("decimal", CanonicalType::Decimal),
    ("numeric", CanonicalType::Decimal),
    ("int", CanonicalType::Integer),
    ("integer", CanonicalType::Integer),
    ("long", CanonicalType::Long),
    ("bigint", CanonicalType::Long),
    ("float", CanonicalType::Float),
    ("double", CanonicalType::Float),
    ("boolean", CanonicalType::Boolean),
    ("timestamp", CanonicalType::TimestampTz),
    ("timestamp_tz", CanonicalType::TimestampTz),
    ("timestamp_ntz", CanonicalType::TimestampNtz),
    ("date", CanonicalType::Date),
    ("array", CanonicalType::Array),
    ("bytes", CanonicalType::Bytes),
    ("object", CanonicalType::Object),
    ("record", CanonicalType::Object),
    ("struct", CanonicalType::Object),
    ("null", CanonicalType::Null),
    ("variant", CanonicalType::Variant),
];

/// Resolve a raw type token to its canonical type.
///
/// ```rust
/// use data_contract_sdk::types::{resolve, CanonicalType, Dialect, TypeHint};
///
/// assert_eq!(resolve("VARCHAR(255)", TypeHint::Sql(Dialect::Postgres)), CanonicalType::String);
/// assert_eq!(resolve("bigint", TypeHint::Sql(Dialect::Generic)), CanonicalType::Long);
/// assert_eq!(resolve("geography", TypeHint::Sql(Dialect::Generic)), CanonicalType::Variant);
/// ```
pub fn resolve(raw: &str, hint: TypeHint<'_>) -> CanonicalType {
    let normalized = normalize(raw);
    match hint {
        TypeHint::Sql(dialect) => resolve_sql(&normalized, dialect),
        TypeHint::Document(aliases) => resolve_document(&normalized, aliases),
    }
}

fn resolve_sql(token: &str, dialect: Dialect) -> CanonicalType {
    if let Some(t) = dialect_override(token, dialect) {
        return t;
    }
    match_tables(token).unwrap_or(CanonicalType::Variant)
}

fn resolve_document(token: &str, aliases: &TypeAliases) -> CanonicalType {
    if let Some(t) = document_type(token) {
        return t;
    }
    if let Some(target) = aliases.get(token) {
        let target = normalize(target);
        if let Some(t) = document_type(&target).or_else(|| match_tables(&target)) {
            return t;
        }
    }
    match_tables(token).unwrap_or(CanonicalType::Object)
}

fn document_type(token: &str) -> Option<CanonicalType> {
    DOCUMENT_TYPES
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, t)| *t)
}

fn match_tables(token: &str) -> Option<CanonicalType> {
    if token.is_empty() {
        return None;
    }
    if let Some((_, t)) = KEYWORDS.iter().find(|(kw, _)| *kw == token) {
        return Some(*t);
    }
    if token.ends_with("[]") {
        return Some(CanonicalType::Array);
    }
    if token.starts_with("timestamp") && token.contains(" with ") && token.ends_with("time zone")
    {
        return Some(CanonicalType::TimestampTz);
    }
    PREFIXES
        .iter()
        .find(|(prefix, _)| token.starts_with(prefix))
        .map(|(_, t)| *t)
}

/// Vendor types whose meaning differs from the shared tables.
fn dialect_override(token: &str, dialect: Dialect) -> Option<CanonicalType> {
    match (dialect, token) {
        (Dialect::BigQuery, "timestamp") => Some(CanonicalType::TimestampTz),
        (Dialect::BigQuery, "int64") => Some(CanonicalType::Long),
        (Dialect::BigQuery, "float64") => Some(CanonicalType::Float),
        (Dialect::BigQuery, "bignumeric") => Some(CanonicalType::Decimal),
        (Dialect::Oracle, "date") => Some(CanonicalType::TimestampNtz),
        (Dialect::Databricks, "timestamp") => Some(CanonicalType::TimestampTz),
        _ => None,
    }
}

/// Lowercase, trim and collapse internal whitespace.
fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(raw: &str) -> CanonicalType {
        resolve(raw, TypeHint::Sql(Dialect::Generic))
    }

    #[test]
    fn test_keywords_before_prefixes() {
        assert_eq!(sql("date"), CanonicalType::Date);
        assert_eq!(sql("TIME"), CanonicalType::String);
        assert_eq!(sql("datetimeoffset"), CanonicalType::TimestampTz);
        assert_eq!(sql("Timestamp With Time Zone"), CanonicalType::TimestampTz);
        assert_eq!(sql("uniqueidentifier"), CanonicalType::String);
    }

    #[test]
    fn test_integer_family_ordering() {
        assert_eq!(sql("bigint"), CanonicalType::Long);
        assert_eq!(sql("BIGINT UNSIGNED"), CanonicalType::Long);
        assert_eq!(sql("int"), CanonicalType::Integer);
        assert_eq!(sql("integer"), CanonicalType::Integer);
        assert_eq!(sql("smallint"), CanonicalType::Integer);
        assert_eq!(sql("tinyint(1)"), CanonicalType::Integer);
        assert_eq!(sql("int8"), CanonicalType::Long);
    }

    #[test]
    fn test_parameterised_types() {
        assert_eq!(sql("varchar(100)"), CanonicalType::String);
        assert_eq!(sql("CHARACTER VARYING(20)"), CanonicalType::String);
        assert_eq!(sql("decimal(10,2)"), CanonicalType::Decimal);
        assert_eq!(sql("NUMBER(38, 0)"), CanonicalType::Decimal);
        assert_eq!(sql("varbinary(max)"), CanonicalType::Bytes);
        assert_eq!(sql("timestamp(6)"), CanonicalType::TimestampNtz);
        assert_eq!(sql("timestamp(3) with time zone"), CanonicalType::TimestampTz);
        assert_eq!(sql("datetime2(7)"), CanonicalType::TimestampNtz);
        assert_eq!(sql("time(6)"), CanonicalType::String);
        assert_eq!(sql("timetz"), CanonicalType::String);
        assert_eq!(sql("TIME WITH TIME ZONE"), CanonicalType::String);
        assert_eq!(sql("time(3) without time zone"), CanonicalType::String);
        assert_eq!(sql("longtext"), CanonicalType::String);
        assert_eq!(sql("integer[]"), CanonicalType::Array);
        assert_eq!(sql("ARRAY<STRING>"), CanonicalType::Array);
        assert_eq!(sql("STRUCT<a: INT>"), CanonicalType::Object);
    }

    #[test]
    fn test_sql_fallback_is_variant() {
        assert_eq!(sql("geography"), CanonicalType::Variant);
        assert_eq!(sql(""), CanonicalType::Variant);
        assert_eq!(sql("   "), CanonicalType::Variant);
    }

    #[test]
    fn test_document_fallback_is_object() {
        let aliases = TypeAliases::new();
        assert_eq!(
            resolve("mystery", TypeHint::Document(&aliases)),
            CanonicalType::Object
        );
    }

    #[test]
    fn test_document_vocabulary() {
        let aliases = TypeAliases::new();
        let doc = |raw| resolve(raw, TypeHint::Document(&aliases));
        assert_eq!(doc("timestamp"), CanonicalType::TimestampTz);
        assert_eq!(doc("number"), CanonicalType::Decimal);
        assert_eq!(doc("record"), CanonicalType::Object);
        assert_eq!(doc("varchar(10)"), CanonicalType::String);
    }

    #[test]
    fn test_document_aliases_are_scoped() {
        let mut aliases = TypeAliases::new();
        aliases.insert("money_amount", "decimal");
        assert_eq!(
            resolve("MONEY_AMOUNT", TypeHint::Document(&aliases)),
            CanonicalType::Decimal
        );

        let empty = TypeAliases::new();
        assert_eq!(
            resolve("money_amount", TypeHint::Document(&empty)),
            CanonicalType::Decimal
        );
        assert_eq!(
            resolve("geo_point", TypeHint::Document(&empty)),
            CanonicalType::Object
        );
    }

    #[test]
    fn test_aliases_from_properties() {
        let value = serde_json::json!("long");
        let other = serde_json::json!("someone");
        let aliases =
            TypeAliases::from_properties([("dc_mapping_counter", &value), ("owner", &other)]);
        assert_eq!(aliases.len(), 1);
        assert_eq!(
            resolve("counter", TypeHint::Document(&aliases)),
            CanonicalType::Long
        );
    }

    #[test]
    fn test_dialect_overrides() {
        assert_eq!(
            resolve("TIMESTAMP", TypeHint::Sql(Dialect::BigQuery)),
            CanonicalType::TimestampTz
        );
        assert_eq!(
            resolve("INT64", TypeHint::Sql(Dialect::BigQuery)),
            CanonicalType::Long
        );
        assert_eq!(
            resolve("DATE", TypeHint::Sql(Dialect::Oracle)),
            CanonicalType::TimestampNtz
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let tokens = ["int", "varchar(3)", "jsonb", "unknown_thing", "NUMERIC(10,2)"];
        for token in tokens {
            let first = sql(token);
            for _ in 0..5 {
                assert_eq!(sql(token), first);
            }
        }
    }
}
