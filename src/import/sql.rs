//! SQL Import functionality
//!
//! Parses `CREATE TABLE` / `CREATE VIEW` DDL in a selected dialect into a
//! data contract. Each table becomes one model of type `table`; each column
//! becomes a field carrying its canonical type, size information, flags and
//! the original vendor type under the dialect's physical type key.
//!
//! Table and column `COMMENT`, `WITH TAG (...)` and `MASKING POLICY` clauses
//! are lifted out of the text before parsing so that every grammar accepts
//! them. `COMMENT ON TABLE/COLUMN ... IS ...` statements are applied after
//! the tables are built.
//!
//! # Validation
//!
//! Imported model and field names and physical types are checked; problems
//! are logged as warnings and never fail the import.

use super::odcs::PROPERTY_PRIMARY_KEY_POSITION;
use super::{ImportError, read_source};
use crate::config::ConverterConfig;
use crate::models::{DataContractSpecification, Field, Model, Server};
use crate::types::{CanonicalType, Dialect, DialectInfo, TypeHint, resolve};
use crate::validation::input::{validate_field_name, validate_model_name, validate_physical_type};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::ast::{
    ColumnDef, ColumnOption, CommentObject, ObjectName, Statement, TableConstraint,
};
use sqlparser::parser::Parser;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const STAGE: &str = "sql";
const INLINE_SOURCE: &str = "<inline>";
const IDENTIFIER_PLACEHOLDER_PREFIX: &str = "__databricks_table_";

// Static regex patterns compiled once for performance
static RE_CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|TRANSIENT|VOLATILE|EXTERNAL)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?([^\s(]+)\s*\("#,
    )
    .expect("Invalid regex")
});
static RE_COMMENT_SINGLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bCOMMENT\s*=?\s*'((?:[^'\\]|''|\\.)*)'"#).expect("Invalid regex")
});
static RE_COMMENT_DOUBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bCOMMENT\s*=?\s*"([^"]*)""#).expect("Invalid regex"));
static RE_TAG_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:WITH\s+)?TAG\s*\(").expect("Invalid regex"));
static RE_MASKING_POLICY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:WITH\s+)?MASKING\s+POLICY\s+([\w.$"]+)(?:\s+USING\s*\([^)]*\))?"#)
        .expect("Invalid regex")
});
static RE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)IDENTIFIER\s*\(\s*([^)]+)\s*\)").expect("Invalid regex"));
static RE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:'([^']*)'|"([^"]*)")"#).expect("Invalid regex"));
static RE_MATERIALIZED_VIEW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CREATE\s+MATERIALIZED\s+VIEW").expect("Invalid regex"));
static RE_TBLPROPERTIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TBLPROPERTIES\s*\(").expect("Invalid regex"));
static RE_CLUSTER_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+CLUSTER\s+BY\s+(?:AUTO|\([^)]*\)|[\w,\s]+)").expect("Invalid regex")
});
static RE_VARIABLE_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s*:([a-zA-Z_][a-zA-Z0-9_]*)").expect("Invalid regex"));
static RE_ARRAY_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ARRAY\s*<\s*:([a-zA-Z_][a-zA-Z0-9_]*)\s*>").expect("Invalid regex"));
static RE_FIELD_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+)\s+:\w+\s+([A-Z][A-Z0-9_]*(?:<[^>]*>)?)").expect("Invalid regex")
});
static RE_COMPLEX_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\w+)\s+(STRUCT<|ARRAY<|MAP<)").expect("Invalid regex"));

/// Metadata lifted out of one `CREATE TABLE` statement before parsing.
#[derive(Debug, Default)]
struct TableMetadata {
    comment: Option<String>,
    tags: Vec<String>,
    column_comments: HashMap<String, String>,
    column_tags: HashMap<String, Vec<String>>,
    masking_policies: HashMap<String, String>,
}

/// Everything the preprocessing passes learned about the source text.
#[derive(Debug, Default)]
struct Preprocessed {
    sql: String,
    /// Placeholder table names mapped to their `IDENTIFIER()` expressions
    identifier_replacements: HashMap<String, String>,
    /// Table metadata keyed by unquoted table name
    tables: HashMap<String, TableMetadata>,
    /// Original `STRUCT<>`/`ARRAY<>`/`MAP<>` column types keyed by
    /// (unquoted table name, column name)
    complex_types: HashMap<(String, String), String>,
}

/// SQL DDL importer.
///
/// # Example
///
/// ```rust
/// use data_contract_sdk::import::SqlImporter;
/// use data_contract_sdk::types::{CanonicalType, Dialect};
///
/// let importer = SqlImporter::new(Dialect::Postgres);
/// let contract = importer
///     .import("CREATE TABLE orders (id BIGINT PRIMARY KEY, amount NUMERIC(10,2));")
///     .unwrap();
/// let amount = &contract.models["orders"].fields["amount"];
/// assert_eq!(amount.field_type, Some(CanonicalType::Decimal));
/// assert_eq!(amount.extensions.get_str("postgresType"), Some("numeric(10,2)"));
/// ```
#[derive(Debug, Clone)]
pub struct SqlImporter {
    pub dialect: Dialect,
    title: String,
    version: String,
}

impl Default for SqlImporter {
    fn default() -> Self {
        Self::new(Dialect::Generic)
    }
}

impl SqlImporter {
    pub fn new(dialect: Dialect) -> Self {
        let defaults = ConverterConfig::default();
        Self {
            dialect,
            title: defaults.import.title,
            version: defaults.import.version,
        }
    }

    /// Importer for a dialect identifier such as `postgresql` or `tsql`.
    ///
    /// Unknown identifiers select the generic grammar, the generic
    /// physical type key and no inferred server.
    pub fn for_identifier(identifier: &str) -> Self {
        Self::new(DialectInfo::lookup(identifier).dialect)
    }

    /// Importer using the configured default dialect and contract template.
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            dialect: config.import.default_dialect,
            title: config.import.title.clone(),
            version: config.import.version.clone(),
        }
    }

    pub fn with_template(mut self, title: impl Into<String>, version: impl Into<String>) -> Self {
        self.title = title.into();
        self.version = version.into();
        self
    }

    /// Import DDL text into a fresh contract.
    pub fn import(&self, ddl: &str) -> Result<DataContractSpecification, ImportError> {
        self.import_named(ddl, INLINE_SOURCE)
    }

    /// Import DDL from a local file.
    pub fn import_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<DataContractSpecification, ImportError> {
        let path = path.as_ref();
        let ddl = read_source(path)?;
        self.import_named(&ddl, &path.display().to_string())
    }

    /// Import DDL text; `source_name` identifies the input in errors.
    pub fn import_named(
        &self,
        ddl: &str,
        source_name: &str,
    ) -> Result<DataContractSpecification, ImportError> {
        let mut contract = DataContractSpecification::template(&self.title, &self.version);
        self.import_into(&mut contract, ddl, source_name)?;
        Ok(contract)
    }

    /// Import DDL into an existing contract.
    ///
    /// On error `contract` is left untouched.
    pub fn import_into(
        &self,
        contract: &mut DataContractSpecification,
        ddl: &str,
        source_name: &str,
    ) -> Result<(), ImportError> {
        let (statements, state) = self.parse(ddl, source_name)?;

        let mut models: Vec<(String, Model)> = Vec::new();
        let mut comments: Vec<(CommentObject, ObjectName, String)> = Vec::new();

        for stmt in statements {
            match stmt {
                Statement::CreateTable(create) => {
                    let name = self.model_name(&create.name, &state);
                    let source_key = object_name_to_string(&create.name);
                    let model = self.build_table(
                        &name,
                        &source_key,
                        &create.columns,
                        &create.constraints,
                        &state,
                    );
                    models.push((name, model));
                }
                Statement::CreateView(create_view) => {
                    let name = self.model_name(&create_view.name, &state);
                    tracing::debug!("Imported view '{}'", name);
                    models.push((name, Model::view()));
                }
                Statement::Comment {
                    object_type,
                    object_name,
                    comment: Some(comment),
                    ..
                } => comments.push((object_type, object_name, comment)),
                _ => {
                    // Other statements (INSERT, ALTER, GRANT, ...) carry no schema.
                }
            }
        }

        for (object_type, object_name, comment) in comments {
            apply_comment_statement(&mut models, object_type, &object_name, comment);
        }

        if let Some(server_type) = self.dialect.server_type() {
            contract
                .servers
                .insert(server_type.to_string(), Server::new(server_type));
        }
        for (name, model) in models {
            if contract.models.contains_key(&name) {
                tracing::warn!("Model '{}' defined more than once; keeping the last", name);
            }
            contract.models.insert(name, model);
        }

        tracing::info!(
            "Imported {} model(s) from {} using the {} dialect",
            contract.models.len(),
            source_name,
            self.dialect
        );
        Ok(())
    }

    /// Run the preprocessing passes and parse the result.
    fn parse(
        &self,
        ddl: &str,
        source_name: &str,
    ) -> Result<(Vec<Statement>, Preprocessed), ImportError> {
        let mut state = Preprocessed::default();
        let mut sql = ddl.to_string();

        if self.dialect == Dialect::Databricks {
            sql = replace_identifier_expressions(&sql, &mut state.identifier_replacements);
            sql = RE_FIELD_VARIABLE
                .replace_all(&sql, |caps: &regex::Captures| {
                    let col_name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                    let type_name = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                    format!("{} {}", col_name, type_name)
                })
                .to_string();
            sql = replace_nested_variables(&sql);
            sql = RE_MATERIALIZED_VIEW
                .replace_all(&sql, "CREATE VIEW")
                .to_string();
            sql = remove_balanced_clause(&sql, &RE_TBLPROPERTIES);
            sql = RE_CLUSTER_BY.replace_all(&sql, "").to_string();
        }

        let normalized = normalize_sql_preserving_quotes(&sql);
        let normalized = convert_backslash_escaped_quotes(&normalized);
        let (normalized, tables) = extract_table_metadata(&normalized);
        state.tables = tables;

        let grammar = self.dialect.grammar();
        let final_sql = if self.dialect.parses_complex_types() {
            normalized
        } else if self.dialect == Dialect::Databricks
            && Parser::parse_sql(grammar.as_ref(), &normalized).is_ok()
        {
            // Parsed as-is; keep the original type strings for restoration.
            let (_, cols) = extract_complex_type_columns(&normalized);
            state.complex_types = cols;
            normalized
        } else {
            let (simplified, cols) = extract_complex_type_columns(&normalized);
            state.complex_types = cols;
            simplified
        };

        match Parser::parse_sql(grammar.as_ref(), &final_sql) {
            Ok(statements) => Ok((statements, state)),
            Err(e) => {
                tracing::warn!("Error parsing SQL from {}: {}", source_name, e);
                Err(ImportError::parse(
                    STAGE,
                    source_name,
                    format!("Error parsing SQL: {}", e),
                    e,
                ))
            }
        }
    }

    fn model_name(&self, name: &ObjectName, state: &Preprocessed) -> String {
        let mut model_name = object_name_to_string(name);

        if model_name.starts_with(IDENTIFIER_PLACEHOLDER_PREFIX)
            && let Some(original_expr) = state.identifier_replacements.get(&model_name)
        {
            match extract_identifier_table_name(original_expr) {
                Some(extracted) => model_name = extracted,
                None => tracing::warn!(
                    "Table name '{}' is only known at runtime; keeping placeholder '{}'",
                    original_expr,
                    model_name
                ),
            }
        }

        if let Err(e) = validate_model_name(&model_name) {
            tracing::warn!("Model name validation warning: {}", e);
        }
        model_name
    }

    /// `source_key` is the unquoted table name as written in the source, which
    /// keys the preprocessing results. It differs from `table_name` only for
    /// `IDENTIFIER()` placeholders.
    fn build_table(
        &self,
        table_name: &str,
        source_key: &str,
        columns: &[ColumnDef],
        constraints: &[TableConstraint],
        state: &Preprocessed,
    ) -> Model {
        let metadata = state.tables.get(source_key);
        let mut model = Model::table();
        if let Some(meta) = metadata {
            model.description = meta.comment.clone();
            model.tags = meta.tags.clone();
        }

        let mut pk_cols: Vec<String> = Vec::new();
        for col in columns {
            let col_name = unquote_identifier(&col.name.value);
            let (field, inline_pk) = self.build_field(source_key, &col_name, col, metadata, state);
            if inline_pk {
                pk_cols.push(col_name.clone());
            }
            model.fields.insert(col_name, field);
        }

        let mut composite_unique: Vec<serde_json::Value> = Vec::new();
        for constraint in constraints {
            match constraint {
                TableConstraint::PrimaryKey(pk) => {
                    for col in &pk.columns {
                        pk_cols.push(unquote_identifier(&col.to_string()));
                    }
                }
                TableConstraint::Unique(unique) => {
                    let cols: Vec<String> = unique
                        .columns
                        .iter()
                        .map(|c| unquote_identifier(&c.to_string()))
                        .collect();
                    if let [single] = cols.as_slice() {
                        if let Some(field) = model.fields.get_mut(single) {
                            field.unique = Some(true);
                        }
                    } else {
                        composite_unique.push(cols.into());
                    }
                }
                _ => {}
            }
        }

        // Key membership overrides whatever nullability the column stated.
        let mut seen = HashSet::new();
        pk_cols.retain(|pk| seen.insert(pk.clone()));
        let composite_key = pk_cols.len() > 1;
        for (position, pk) in pk_cols.iter().enumerate() {
            match model.fields.get_mut(pk) {
                Some(field) => {
                    field.mark_primary_key();
                    if composite_key {
                        field
                            .extensions
                            .insert(PROPERTY_PRIMARY_KEY_POSITION, position as i64 + 1);
                    }
                }
                None => tracing::warn!(
                    "Primary key column '{}' not found in table '{}'",
                    pk,
                    table_name
                ),
            }
        }
        if !composite_unique.is_empty() {
            model
                .extensions
                .insert("uniqueConstraints", composite_unique);
        }

        tracing::debug!(
            "Imported table '{}' with {} field(s)",
            table_name,
            model.fields.len()
        );
        model
    }

    /// Build one field. Also reports whether the column declared an inline
    /// primary key.
    fn build_field(
        &self,
        source_key: &str,
        col_name: &str,
        col: &ColumnDef,
        metadata: Option<&TableMetadata>,
        state: &Preprocessed,
    ) -> (Field, bool) {
        let complex_key = (source_key.to_string(), col_name.to_string());
        let physical_type = match state.complex_types.get(&complex_key) {
            Some(original) => original.clone(),
            None => col.data_type.to_string().to_lowercase(),
        };
        let canonical = resolve(&physical_type, TypeHint::Sql(self.dialect));

        if let Err(e) = validate_field_name(col_name) {
            tracing::warn!("Field name validation warning for '{}': {}", col_name, e);
        }
        if let Err(e) = validate_physical_type(&physical_type) {
            tracing::warn!(
                "Physical type validation warning for '{}': {}",
                physical_type,
                e
            );
        }

        let mut field = Field::new(canonical);
        apply_size(&mut field, canonical, &physical_type);
        field
            .extensions
            .set_physical_type(self.dialect, physical_type);

        let mut nullable = true;
        let mut is_pk = false;
        for opt_def in &col.options {
            match &opt_def.option {
                ColumnOption::NotNull => nullable = false,
                ColumnOption::Null => nullable = true,
                ColumnOption::Unique(_) => field.unique = Some(true),
                ColumnOption::PrimaryKey(_) => is_pk = true,
                ColumnOption::Comment(comment) => field.description = Some(comment.clone()),
                ColumnOption::Default(expr) => {
                    field.extensions.insert("default", expr.to_string());
                }
                option @ ColumnOption::Generated { .. } => {
                    field.extensions.insert("generated", option.to_string());
                }
                _ => {}
            }
        }
        field.required = Some(!nullable);

        if let Some(meta) = metadata {
            if let Some(comment) = meta.column_comments.get(col_name) {
                field.description = Some(comment.clone());
            }
            if let Some(tags) = meta.column_tags.get(col_name) {
                field.tags = tags.clone();
            }
            if let Some(policy) = meta.masking_policies.get(col_name) {
                field.classification = Some(policy.clone());
            }
        }

        (field, is_pk)
    }
}

/// Fill `maxLength` or `precision`/`scale` from the type's parameters.
///
/// Parameters that are not integers (`varchar(max)`) give no size info.
fn apply_size(field: &mut Field, canonical: CanonicalType, physical_type: &str) {
    let Some(args) = type_arguments(physical_type) else {
        return;
    };
    match (canonical, args.as_slice()) {
        (t, [length]) if t.is_length_bounded() => {
            field.max_length = length.parse().ok();
        }
        (CanonicalType::Decimal, [precision]) => {
            if let Ok(precision) = precision.parse() {
                field.precision = Some(precision);
                field.scale = Some(0);
            }
        }
        (CanonicalType::Decimal, [precision, scale]) => {
            if let (Ok(precision), Ok(scale)) = (precision.parse(), scale.parse()) {
                field.precision = Some(precision);
                field.scale = Some(scale);
            }
        }
        _ => {}
    }
}

/// Arguments of the first parenthesised group of a scalar type.
fn type_arguments(physical_type: &str) -> Option<Vec<&str>> {
    let open = physical_type.find('(')?;
    if physical_type[..open].contains('<') {
        return None;
    }
    let close = open + physical_type[open..].find(')')?;
    Some(
        physical_type[open + 1..close]
            .split(',')
            .map(str::trim)
            .collect(),
    )
}

/// Apply a `COMMENT ON TABLE|COLUMN` statement to the built models.
fn apply_comment_statement(
    models: &mut [(String, Model)],
    object_type: CommentObject,
    object_name: &ObjectName,
    comment: String,
) {
    let parts: Vec<String> = object_name
        .0
        .iter()
        .map(|part| unquote_identifier(&part.to_string()))
        .collect();
    let find = |models: &mut [(String, Model)], table: &str| -> Option<usize> {
        models.iter().position(|(name, _)| name == table)
    };

    match object_type {
        CommentObject::Table => {
            if let Some(table) = parts.last()
                && let Some(idx) = find(models, table)
            {
                models[idx].1.description = Some(comment);
            }
        }
        CommentObject::Column => {
            if let [.., table, column] = parts.as_slice()
                && let Some(idx) = find(models, table)
                && let Some(field) = models[idx].1.fields.get_mut(column)
            {
                field.description = Some(comment);
            }
        }
        _ => {}
    }
}

/// Strip quote characters from an identifier
///
/// Handles `"double"`, `` `backtick` `` and `[bracket]` quoting, including
/// doubled quote characters inside the identifier.
fn unquote_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    let quoted = |open: char, close: char| {
        trimmed.len() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close)
    };

    if quoted('"', '"') {
        return trimmed[1..trimmed.len() - 1].replace("\"\"", "\"");
    }
    if quoted('`', '`') {
        return trimmed[1..trimmed.len() - 1].replace("``", "`");
    }
    if quoted('[', ']') {
        return trimmed[1..trimmed.len() - 1].replace("]]", "]");
    }
    trimmed.to_string()
}

/// Final part of a possibly schema-qualified name, unquoted.
fn object_name_to_string(name: &ObjectName) -> String {
    let raw_name = name
        .0
        .last()
        .map(|part| part.to_string())
        .unwrap_or_else(|| name.to_string());
    unquote_identifier(&raw_name)
}

/// Same as [`object_name_to_string`] for a raw name token from the source.
fn table_key(raw: &str) -> String {
    let mut depth_quote: Option<char> = None;
    let mut last_start = 0;
    for (idx, ch) in raw.char_indices() {
        match (depth_quote, ch) {
            (None, '"' | '`') => depth_quote = Some(ch),
            (None, '[') => depth_quote = Some(']'),
            (Some(q), c) if c == q => depth_quote = None,
            (None, '.') => last_start = idx + 1,
            _ => {}
        }
    }
    unquote_identifier(&raw[last_start..])
}

/// Replace Databricks `IDENTIFIER(...)` table names with placeholders.
fn replace_identifier_expressions(sql: &str, replacements: &mut HashMap<String, String>) -> String {
    let mut counter = 0;
    RE_IDENTIFIER
        .replace_all(sql, |caps: &regex::Captures| {
            let expr = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            counter += 1;
            let placeholder = format!("{}{}__", IDENTIFIER_PLACEHOLDER_PREFIX, counter);
            replacements.insert(placeholder.clone(), expr.to_string());
            placeholder
        })
        .to_string()
}

/// Table name from the string literals of an `IDENTIFIER()` expression.
///
/// Returns `None` when the expression contains only variables.
fn extract_identifier_table_name(expr: &str) -> Option<String> {
    let parts: Vec<&str> = RE_LITERAL
        .captures_iter(expr)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| m.as_str())
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("").trim_matches('.').to_string())
}

/// Replace `:variable` type references inside `STRUCT<>` and `ARRAY<>` with
/// `STRING` until nothing changes.
fn replace_nested_variables(sql: &str) -> String {
    const MAX_ITERATIONS: usize = 10;
    let mut result = sql.to_string();

    for _ in 0..MAX_ITERATIONS {
        let next = RE_VARIABLE_TYPE.replace_all(&result, ": STRING").to_string();
        let next = RE_ARRAY_VARIABLE
            .replace_all(&next, "ARRAY<STRING>")
            .to_string();
        if next == result {
            break;
        }
        result = next;
    }
    result
}

/// Remove every `KEYWORD ( ... )` clause matched by `keyword`, including
/// nested parentheses.
fn remove_balanced_clause(sql: &str, keyword: &Regex) -> String {
    let mut result = sql.to_string();
    let mut search_start = 0;

    while let Some((m_start, m_end)) = keyword
        .find_at(&result, search_start)
        .map(|m| (m.start(), m.end()))
    {
        let open = m_end - 1;
        match find_closing_paren(&result, open) {
            Some(close) => {
                result.replace_range(m_start..=close, "");
                search_start = m_start;
            }
            None => search_start = m_end,
        }
    }
    result
}

/// Index of the `)` matching the `(` at `open`, skipping quoted text.
fn find_closing_paren(sql: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (idx, ch) in sql[open..].char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the next `;` outside quotes, or the end of the text.
fn find_statement_end(sql: &str, from: usize) -> usize {
    let mut quote: Option<char> = None;
    for (idx, ch) in sql[from..].char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, ';') => return from + idx,
            _ => {}
        }
    }
    sql.len()
}

/// Split on `,` at nesting depth zero, ignoring quoted text.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut parens = 0i32;
    let mut angles = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '(') => parens += 1,
            (None, ')') => parens -= 1,
            (None, '<') if parens == 0 => angles += 1,
            (None, '>') if parens == 0 && angles > 0 => angles -= 1,
            (None, ',') if parens == 0 && angles == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Turn `a = 'b', c` into `["a=b", "c"]`.
fn parse_tag_list(inner: &str) -> Vec<String> {
    split_top_level(inner)
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((key, value)) => format!(
                "{}={}",
                unquote_identifier(key),
                value.trim().trim_matches(|c| c == '\'' || c == '"')
            ),
            None => unquote_identifier(tag),
        })
        .collect()
}

/// Remove `[WITH] TAG (...)` clauses from `text`, returning the tags found.
fn take_tag_clauses(text: &mut String) -> Vec<String> {
    let mut tags = Vec::new();
    while let Some(m) = RE_TAG_CLAUSE.find(text) {
        let open = m.end() - 1;
        let Some(close) = find_closing_paren(text, open) else {
            break;
        };
        tags.extend(parse_tag_list(&text[open + 1..close]));
        text.replace_range(m.start()..=close, "");
    }
    tags
}

/// Remove the first `COMMENT [=] '...'` clause, returning its text.
fn take_comment(text: &mut String) -> Option<String> {
    let (range, comment) = if let Some(caps) = RE_COMMENT_SINGLE.captures(text) {
        let whole = caps.get(0)?;
        let comment = caps.get(1)?.as_str().replace("''", "'");
        (whole.range(), comment)
    } else {
        let caps = RE_COMMENT_DOUBLE.captures(text)?;
        (caps.get(0)?.range(), caps.get(1)?.as_str().to_string())
    };
    text.replace_range(range, "");
    Some(comment)
}

/// Leading identifier of a column definition, unquoted.
fn leading_identifier(segment: &str) -> Option<String> {
    let trimmed = segment.trim_start();
    let mut chars = trimmed.char_indices();
    let (_, first) = chars.next()?;
    let end = match first {
        '"' | '`' | '[' => {
            let close = if first == '[' { ']' } else { first };
            trimmed[1..].find(close).map(|i| i + 2)?
        }
        _ => trimmed
            .find(char::is_whitespace)
            .unwrap_or(trimmed.len()),
    };
    Some(unquote_identifier(&trimmed[..end]))
}

fn is_constraint_segment(segment: &str) -> bool {
    let trimmed = segment.trim_start();
    let keyword_end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    let keyword = trimmed[..keyword_end].to_uppercase();
    let rest = trimmed[keyword_end..].trim_start();
    let next_end = rest
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(rest.len());
    let next_word = rest[..next_end].to_uppercase();

    match keyword.as_str() {
        "CONSTRAINT" => !next_word.is_empty(),
        "PRIMARY" | "FOREIGN" => next_word == "KEY",
        "UNIQUE" => rest.starts_with('(') || matches!(next_word.as_str(), "KEY" | "INDEX"),
        "CHECK" => rest.starts_with('('),
        // `KEY idx (a, b)` names an index; `key VARCHAR(10)` is a column.
        "KEY" | "INDEX" => {
            rest.starts_with('(')
                || (rest[next_end..].trim_start().starts_with('(')
                    && resolve(&next_word, TypeHint::Sql(Dialect::Generic))
                        == CanonicalType::Variant)
        }
        _ => false,
    }
}

/// Lift comments, tags and masking policies out of every `CREATE TABLE`.
///
/// Assumes SQL is already normalized (single line, single spaces).
fn extract_table_metadata(sql: &str) -> (String, HashMap<String, TableMetadata>) {
    let mut out = String::with_capacity(sql.len());
    let mut tables = HashMap::new();
    let mut cursor = 0;

    for caps in RE_CREATE_TABLE.captures_iter(sql) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < cursor {
            continue;
        }
        let open = whole.end() - 1;
        let Some(close) = find_closing_paren(sql, open) else {
            continue;
        };
        let end = find_statement_end(sql, close + 1);

        let mut meta = TableMetadata::default();
        let mut columns = Vec::new();
        for segment in split_top_level(&sql[open + 1..close]) {
            if is_constraint_segment(segment) {
                columns.push(segment.trim().to_string());
                continue;
            }
            let mut segment = segment.to_string();
            if let Some(col_name) = leading_identifier(&segment) {
                let tags = take_tag_clauses(&mut segment);
                if !tags.is_empty() {
                    meta.column_tags.insert(col_name.clone(), tags);
                }
                if let Some(caps) = RE_MASKING_POLICY.captures(&segment)
                    && let (Some(whole), Some(policy)) = (caps.get(0), caps.get(1))
                {
                    let policy = unquote_identifier(policy.as_str());
                    let range = whole.range();
                    segment.replace_range(range, "");
                    meta.masking_policies.insert(col_name.clone(), policy);
                }
                if let Some(comment) = take_comment(&mut segment) {
                    meta.column_comments.insert(col_name, comment);
                }
            }
            columns.push(segment.trim().to_string());
        }

        let mut tail = sql[close + 1..end].to_string();
        meta.tags = take_tag_clauses(&mut tail);
        meta.comment = take_comment(&mut tail);

        out.push_str(&sql[cursor..=open]);
        out.push_str(&columns.join(", "));
        out.push(')');
        out.push_str(tail.trim_end());
        cursor = end;

        tables.insert(table_key(name.as_str()), meta);
    }

    out.push_str(&sql[cursor..]);
    (out, tables)
}

/// Collapse the SQL onto one line, dropping `--` and `/* */` comments and
/// redundant whitespace outside quoted strings.
fn normalize_sql_preserving_quotes(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;
    let mut last_char_was_space = false;

    let push_space = |result: &mut String, last: &mut bool| {
        if !*last {
            result.push(' ');
            *last = true;
        }
    };

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(_), '\\') => {
                result.push(ch);
                if let Some(next) = chars.next() {
                    result.push(next);
                }
                last_char_was_space = false;
            }
            (Some(q), c) if c == q => {
                result.push(ch);
                if chars.peek() == Some(&q) {
                    // Doubled quote is an escaped quote, not the end of the string
                    result.push(q);
                    chars.next();
                } else {
                    quote = None;
                }
                last_char_was_space = false;
            }
            (Some(_), '\n' | '\r') => push_space(&mut result, &mut last_char_was_space),
            (Some(_), _) => {
                result.push(ch);
                last_char_was_space = false;
            }
            (None, '\'' | '"') => {
                quote = Some(ch);
                result.push(ch);
                last_char_was_space = false;
            }
            (None, '-') if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' || c == '\r' {
                        break;
                    }
                }
                push_space(&mut result, &mut last_char_was_space);
            }
            (None, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                push_space(&mut result, &mut last_char_was_space);
            }
            (None, ' ' | '\t' | '\n' | '\r') => {
                push_space(&mut result, &mut last_char_was_space)
            }
            (None, _) => {
                result.push(ch);
                last_char_was_space = false;
            }
        }
    }

    result.trim().to_string()
}

/// Convert `\'` and `\"` inside strings to the doubled-quote form the
/// parser understands.
fn convert_backslash_escaped_quotes(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), '\\') => match chars.peek().copied() {
                Some(next) if next == q => {
                    result.push(q);
                    result.push(q);
                    chars.next();
                }
                Some(next) => {
                    result.push(ch);
                    result.push(next);
                    chars.next();
                }
                None => result.push(ch),
            },
            (Some(q), c) if c == q => {
                quote = None;
                result.push(ch);
            }
            (None, '\'' | '"') => {
                quote = Some(ch);
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Replace `STRUCT<..>`, `ARRAY<..>` and `MAP<..>` column types with
/// `STRING`, returning the original type strings keyed by
/// (table, column).
///
/// Assumes SQL is already normalized (single line, single spaces). Types
/// outside a `CREATE TABLE` body are still replaced but not recorded.
fn extract_complex_type_columns(sql: &str) -> (String, HashMap<(String, String), String>) {
    let table_bodies: Vec<(usize, usize, String)> = RE_CREATE_TABLE
        .captures_iter(sql)
        .filter_map(|caps| {
            let (whole, name) = (caps.get(0)?, caps.get(1)?);
            let open = whole.end() - 1;
            let close = find_closing_paren(sql, open)?;
            Some((open, close, table_key(name.as_str())))
        })
        .collect();

    let mut replacements: Vec<(usize, usize, String, String)> = Vec::new();

    for cap in RE_COMPLEX_TYPE.captures_iter(sql) {
        let (Some(col), Some(kind)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        let type_start = kind.start();
        let bracket_start = kind.end() - 1;
        let mut depth = 0usize;
        let mut type_end = None;

        for (idx, ch) in sql[bracket_start..].char_indices() {
            match ch {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        type_end = Some(bracket_start + idx + 1);
                        break;
                    }
                }
                _ => {}
            }
        }

        if let Some(end) = type_end {
            if replacements.last().is_some_and(|(_, prev_end, _, _)| type_start < *prev_end) {
                // Nested inside a type already captured
                continue;
            }
            replacements.push((
                type_start,
                end,
                unquote_identifier(col.as_str()),
                sql[type_start..end].to_string(),
            ));
        }
    }

    let mut result = sql.to_string();
    let mut column_types = HashMap::new();
    for (start, end, col_name, full_type) in replacements.into_iter().rev() {
        result.replace_range(start..end, "STRING");
        let owner = table_bodies
            .iter()
            .find(|(open, close, _)| *open < start && start < *close);
        match owner {
            Some((_, _, table)) => {
                column_types.insert((table.clone(), col_name), full_type);
            }
            None => tracing::debug!(
                "Complex type for '{}' outside a CREATE TABLE body; original type not kept",
                col_name
            ),
        }
    }
    (result, column_types)
}
