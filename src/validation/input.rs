//! Identifier and type token checks.
//!
//! Imports never fail on these: real-world DDL and contracts carry unusual
//! but legal names. Importers log the returned error as a warning.

use serde::Serialize;
use thiserror::Error;

/// Maximum length for model and field names
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Maximum length for a physical type token
pub const MAX_TYPE_LENGTH: usize = 1024;

/// Errors that can occur during input validation.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} contains invalid characters: {reason}")]
    InvalidCharacters { field: &'static str, reason: String },

    #[error("{field} is a reserved word: {word}")]
    ReservedWord { field: &'static str, word: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check a model (table or view) name.
///
/// Qualified names such as `schema.table` are accepted.
///
/// ```
/// use data_contract_sdk::validation::input::validate_model_name;
///
/// assert!(validate_model_name("orders").is_ok());
/// assert!(validate_model_name("sales.orders").is_ok());
/// assert!(validate_model_name("").is_err());
/// assert!(validate_model_name("select").is_err());
/// ```
pub fn validate_model_name(name: &str) -> ValidationResult<()> {
    validate_identifier("model name", name)
}

/// Check a field (column) name.
pub fn validate_field_name(name: &str) -> ValidationResult<()> {
    validate_identifier("field name", name)
}

fn validate_identifier(field: &'static str, name: &str) -> ValidationResult<()> {
    let Some(first) = name.chars().next() else {
        return Err(ValidationError::Empty(field));
    };

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LENGTH,
            actual: name.len(),
        });
    }

    if !first.is_alphabetic() && first != '_' {
        return Err(ValidationError::InvalidCharacters {
            field,
            reason: "must start with a letter or underscore".to_string(),
        });
    }

    if let Some(c) = name
        .chars()
        .find(|c| !c.is_alphanumeric() && !matches!(c, '_' | '-' | '.' | '$'))
    {
        return Err(ValidationError::InvalidCharacters {
            field,
            reason: format!("invalid character: '{}'", c),
        });
    }

    if !name.contains('.') && is_sql_reserved_word(name) {
        return Err(ValidationError::ReservedWord {
            field,
            word: name.to_string(),
        });
    }

    Ok(())
}

/// Check a physical type token for statement separators or comments.
///
/// ```
/// use data_contract_sdk::validation::input::validate_physical_type;
///
/// assert!(validate_physical_type("numeric(10,2)").is_ok());
/// assert!(validate_physical_type("STRUCT<a: STRING, b: ARRAY<INT>>").is_ok());
/// assert!(validate_physical_type("int; DROP TABLE x").is_err());
/// ```
pub fn validate_physical_type(data_type: &str) -> ValidationResult<()> {
    if data_type.trim().is_empty() {
        return Err(ValidationError::Empty("physical type"));
    }

    if data_type.len() > MAX_TYPE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "physical type",
            max: MAX_TYPE_LENGTH,
            actual: data_type.len(),
        });
    }

    if data_type.contains(';') || data_type.contains("--") || data_type.contains("/*") {
        return Err(ValidationError::InvalidCharacters {
            field: "physical type",
            reason: "contains SQL comment or statement separator".to_string(),
        });
    }

    Ok(())
}

fn is_sql_reserved_word(word: &str) -> bool {
    const RESERVED_WORDS: &[&str] = &[
        "all", "alter", "and", "as", "between", "by", "case", "check", "constraint", "create",
        "cross", "delete", "distinct", "drop", "else", "end", "except", "exists", "foreign",
        "from", "full", "grant", "group", "having", "in", "inner", "insert", "intersect", "into",
        "is", "join", "left", "like", "not", "null", "on", "or", "order", "outer", "primary",
        "references", "revoke", "right", "select", "set", "table", "then", "union", "unique",
        "update", "using", "values", "when", "where", "with",
    ];

    let lower = word.to_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
}
