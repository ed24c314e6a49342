//! Dialect registry
//!
//! One table row per supported SQL dialect. Each row names the identifiers
//! that select it, the extension key its physical types are stored under,
//! and the server type inferred when importing DDL written in it. Parser
//! grammars are resolved from the same enum so the three mappings can never
//! drift apart.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    AnsiDialect, BigQueryDialect, DatabricksDialect as OfficialDatabricksDialect,
    Dialect as SqlDialect, GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect,
    PostgreSqlDialect, RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
};
use std::fmt;
use std::str::FromStr;

/// Extension key used when no dialect-specific key applies.
pub const GENERIC_PHYSICAL_TYPE_KEY: &str = "physicalType";

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    SqlServer,
    Oracle,
    Snowflake,
    BigQuery,
    Redshift,
    Databricks,
    Db2,
    Sqlite,
    Hive,
    Ansi,
    #[default]
    Generic,
}

/// Registry row for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectInfo {
    pub dialect: Dialect,
    /// Canonical identifier, also used as the server map key
    pub name: &'static str,
    /// Additional identifiers accepted by [`Dialect::from_str`]
    pub aliases: &'static [&'static str],
    /// Extension key for the original vendor type string
    pub physical_type_key: &'static str,
    /// Server type recorded when importing DDL in this dialect
    pub server_type: Option<&'static str>,
}

static REGISTRY: [DialectInfo; 13] = [
    DialectInfo {
        dialect: Dialect::Postgres,
        name: "postgres",
        aliases: &["postgresql"],
        physical_type_key: "postgresType",
        server_type: Some("postgres"),
    },
    DialectInfo {
        dialect: Dialect::MySql,
        name: "mysql",
        aliases: &["mariadb"],
        physical_type_key: "mysqlType",
        server_type: Some("mysql"),
    },
    DialectInfo {
        dialect: Dialect::SqlServer,
        name: "sqlserver",
        aliases: &["mssql", "tsql"],
        physical_type_key: "sqlserverType",
        server_type: Some("sqlserver"),
    },
    DialectInfo {
        dialect: Dialect::Oracle,
        name: "oracle",
        aliases: &[],
        physical_type_key: "oracleType",
        server_type: Some("oracle"),
    },
    DialectInfo {
        dialect: Dialect::Snowflake,
        name: "snowflake",
        aliases: &[],
        physical_type_key: "snowflakeType",
        server_type: Some("snowflake"),
    },
    DialectInfo {
        dialect: Dialect::BigQuery,
        name: "bigquery",
        aliases: &[],
        physical_type_key: "bigqueryType",
        server_type: Some("bigquery"),
    },
    DialectInfo {
        dialect: Dialect::Redshift,
        name: "redshift",
        aliases: &[],
        physical_type_key: "redshiftType",
        server_type: Some("redshift"),
    },
    DialectInfo {
        dialect: Dialect::Databricks,
        name: "databricks",
        aliases: &["spark"],
        physical_type_key: "databricksType",
        server_type: Some("databricks"),
    },
    DialectInfo {
        dialect: Dialect::Db2,
        name: "db2",
        aliases: &[],
        physical_type_key: GENERIC_PHYSICAL_TYPE_KEY,
        server_type: Some("db2"),
    },
    DialectInfo {
        dialect: Dialect::Sqlite,
        name: "sqlite",
        aliases: &[],
        physical_type_key: GENERIC_PHYSICAL_TYPE_KEY,
        server_type: Some("sqlite"),
    },
    DialectInfo {
        dialect: Dialect::Hive,
        name: "hive",
        aliases: &[],
        physical_type_key: GENERIC_PHYSICAL_TYPE_KEY,
        server_type: Some("hive"),
    },
    DialectInfo {
        dialect: Dialect::Ansi,
        name: "ansi",
        aliases: &[],
        physical_type_key: GENERIC_PHYSICAL_TYPE_KEY,
        server_type: None,
    },
    DialectInfo {
        dialect: Dialect::Generic,
        name: "generic",
        aliases: &[],
        physical_type_key: GENERIC_PHYSICAL_TYPE_KEY,
        server_type: None,
    },
];

impl DialectInfo {
    /// All registry rows.
    pub fn all() -> &'static [DialectInfo] {
        &REGISTRY
    }

    /// Look up a dialect identifier, falling back to the generic row.
    ///
    /// ```rust
    /// use data_contract_sdk::types::dialect::DialectInfo;
    ///
    /// assert_eq!(DialectInfo::lookup("PostgreSQL").physical_type_key, "postgresType");
    /// assert_eq!(DialectInfo::lookup("teradata").server_type, None);
    /// ```
    pub fn lookup(identifier: &str) -> &'static DialectInfo {
        identifier
            .parse::<Dialect>()
            .map(|d| d.info())
            .unwrap_or_else(|_| Dialect::Generic.info())
    }

    /// Distinct physical type keys in registry order, generic key last.
    pub fn physical_type_keys() -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        for row in REGISTRY.iter() {
            if row.physical_type_key != GENERIC_PHYSICAL_TYPE_KEY
                && !keys.contains(&row.physical_type_key)
            {
                keys.push(row.physical_type_key);
            }
        }
        keys.push(GENERIC_PHYSICAL_TYPE_KEY);
        keys
    }
}

impl Dialect {
    pub fn info(&self) -> &'static DialectInfo {
        REGISTRY
            .iter()
            .find(|row| row.dialect == *self)
            .unwrap_or(&REGISTRY[REGISTRY.len() - 1])
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn physical_type_key(&self) -> &'static str {
        self.info().physical_type_key
    }

    pub fn server_type(&self) -> Option<&'static str> {
        self.info().server_type
    }

    /// Parser grammar for this dialect.
    ///
    /// Oracle and DB2 have no dedicated grammar and parse with the generic one.
    pub fn grammar(&self) -> Box<dyn SqlDialect + Send + Sync> {
        match self {
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::MySql => Box::new(MySqlDialect {}),
            Dialect::SqlServer => Box::new(MsSqlDialect {}),
            Dialect::Snowflake => Box::new(SnowflakeDialect {}),
            Dialect::BigQuery => Box::new(BigQueryDialect {}),
            Dialect::Redshift => Box::new(RedshiftSqlDialect {}),
            Dialect::Databricks => Box::new(DatabricksGrammar::new()),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
            Dialect::Hive => Box::new(HiveDialect {}),
            Dialect::Ansi => Box::new(AnsiDialect {}),
            Dialect::Oracle | Dialect::Db2 | Dialect::Generic => Box::new(GenericDialect {}),
        }
    }

    /// Whether the grammar parses `STRUCT<..>`, `ARRAY<..>` and `MAP<..>` natively.
    pub fn parses_complex_types(&self) -> bool {
        matches!(self, Dialect::BigQuery | Dialect::Hive)
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        REGISTRY
            .iter()
            .find(|row| row.name == lower || row.aliases.contains(&lower.as_str()))
            .map(|row| row.dialect)
            .ok_or_else(|| format!("Unknown SQL dialect: {}", s))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Databricks grammar that also accepts `:variable` references in identifiers.
#[derive(Debug)]
struct DatabricksGrammar {
    official: OfficialDatabricksDialect,
}

impl DatabricksGrammar {
    fn new() -> Self {
        Self {
            official: OfficialDatabricksDialect {},
        }
    }
}

impl SqlDialect for DatabricksGrammar {
    fn is_identifier_start(&self, ch: char) -> bool {
        self.official.is_identifier_start(ch) || ch == ':'
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        self.official.is_identifier_part(ch) || ch == ':'
    }

    fn is_delimited_identifier_start(&self, ch: char) -> bool {
        self.official.is_delimited_identifier_start(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_same_row() {
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert_eq!("tsql".parse::<Dialect>().unwrap(), Dialect::SqlServer);
    }

    #[test]
    fn test_unknown_identifier_falls_back_to_generic() {
        let info = DialectInfo::lookup("teradata");
        assert_eq!(info.dialect, Dialect::Generic);
        assert_eq!(info.physical_type_key, GENERIC_PHYSICAL_TYPE_KEY);
        assert!(info.server_type.is_none());
    }

    #[test]
    fn test_every_variant_has_exactly_one_row() {
        for row in DialectInfo::all() {
            let count = DialectInfo::all()
                .iter()
                .filter(|r| r.dialect == row.dialect)
                .count();
            assert_eq!(count, 1, "duplicate row for {}", row.name);
            assert_eq!(row.dialect.info().name, row.name);
        }
    }

    #[test]
    fn test_physical_type_keys_order() {
        let keys = DialectInfo::physical_type_keys();
        assert_eq!(keys.first(), Some(&"postgresType"));
        assert_eq!(keys.last(), Some(&GENERIC_PHYSICAL_TYPE_KEY));
        assert_eq!(
            keys.iter()
                .filter(|k| **k == GENERIC_PHYSICAL_TYPE_KEY)
                .count(),
            1
        );
    }

    #[test]
    fn test_server_types() {
        assert_eq!(Dialect::Snowflake.server_type(), Some("snowflake"));
        assert_eq!(Dialect::Ansi.server_type(), None);
        assert_eq!(Dialect::BigQuery.physical_type_key(), "bigqueryType");
    }
}
