//! Converter configuration
//!
//! Handles parsing of `.datacontract.toml` configuration files, environment
//! variable overrides, and lookup of required environment variables.

use crate::types::Dialect;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".datacontract.toml";

/// Environment variable for the default SQL dialect
pub const ENV_SQL_DIALECT: &str = "DATACONTRACT_SQL_DIALECT";

/// Environment variable for the ODCS api version written on export
pub const ENV_ODCS_API_VERSION: &str = "DATACONTRACT_ODCS_API_VERSION";

/// Errors raised while resolving configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Missing required environment variable: {variable}")]
    MissingVariable { variable: String },
    #[error("Invalid configuration file {path}: {reason}")]
    InvalidFile { path: String, reason: String },
    #[error("IO error reading configuration: {0}")]
    Io(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Source of environment variables.
///
/// The process environment in production; tests inject a closure so they
/// never mutate shared process state.
pub trait EnvLookup {
    fn var(&self, name: &str) -> Option<String>;

    /// Look up a variable that must be present and non-empty.
    fn required(&self, name: &str) -> ConfigResult<String> {
        match self.var(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::MissingVariable {
                variable: name.to_string(),
            }),
        }
    }
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Import defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSection {
    /// Dialect used when a DDL import does not name one
    #[serde(default)]
    pub default_dialect: Dialect,

    /// Title given to contracts created from DDL
    #[serde(default = "default_title")]
    pub title: String,

    /// Version given to contracts created from DDL
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_title() -> String {
    "My Data Contract".to_string()
}

fn default_version() -> String {
    "0.0.1".to_string()
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            default_dialect: Dialect::default(),
            title: default_title(),
            version: default_version(),
        }
    }
}

/// Export defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// `apiVersion` written into ODCS documents
    #[serde(default = "default_api_version")]
    pub odcs_api_version: String,
}

fn default_api_version() -> String {
    crate::models::odcs::ODCS_API_VERSION.to_string()
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            odcs_api_version: default_api_version(),
        }
    }
}

/// Main configuration structure
///
/// Represents the `.datacontract.toml` configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConverterConfig {
    #[serde(default)]
    pub import: ImportSection,

    #[serde(default)]
    pub export: ExportSection,
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a directory
    ///
    /// Looks for `.datacontract.toml` in the directory and falls back to
    /// defaults if it is absent. Environment overrides are applied last.
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        Self::load_with_env(dir, &ProcessEnv)
    }

    pub fn load_with_env(dir: &Path, env: &impl EnvLookup) -> ConfigResult<Self> {
        let config_path = dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Io(format!("Failed to read config: {}", e)))?;
            Self::parse(&content).map_err(|e| match e {
                ConfigError::InvalidFile { reason, .. } => ConfigError::InvalidFile {
                    path: config_path.display().to_string(),
                    reason,
                },
                other => other,
            })?
        } else {
            Self::default()
        };

        config.apply_env_overrides(env);
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFile {
            path: CONFIG_FILENAME.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Io(format!("Failed to serialize config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self, env: &impl EnvLookup) {
        if let Some(dialect) = env.var(ENV_SQL_DIALECT) {
            match dialect.parse() {
                Ok(dialect) => self.import.default_dialect = dialect,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_SQL_DIALECT, e),
            }
        }

        if let Some(version) = env.var(ENV_ODCS_API_VERSION) {
            self.export.odcs_api_version = version;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::new();
        assert_eq!(config.import.default_dialect, Dialect::Generic);
        assert_eq!(config.import.title, "My Data Contract");
        assert_eq!(config.export.odcs_api_version, "v3.0.1");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[import]
default_dialect = "snowflake"
title = "Warehouse"

[export]
odcs_api_version = "v3.1.0"
"#;
        let config = ConverterConfig::parse(toml).unwrap();
        assert_eq!(config.import.default_dialect, Dialect::Snowflake);
        assert_eq!(config.import.title, "Warehouse");
        assert_eq!(config.import.version, "0.0.1");
        assert_eq!(config.export.odcs_api_version, "v3.1.0");
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let err = ConverterConfig::parse("[import\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile { .. }));
    }

    #[test]
    fn test_load_missing_file_uses_defaults_and_env() {
        let dir = tempdir().unwrap();
        let env = env_from(&[(ENV_SQL_DIALECT, "postgresql")]);
        let config = ConverterConfig::load_with_env(dir.path(), &env).unwrap();
        assert_eq!(config.import.default_dialect, Dialect::Postgres);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "[import]\ndefault_dialect = \"bigquery\"\n",
        )
        .unwrap();
        let env = env_from(&[]);
        let config = ConverterConfig::load_with_env(dir.path(), &env).unwrap();
        assert_eq!(config.import.default_dialect, Dialect::BigQuery);
    }

    #[test]
    fn test_unknown_dialect_override_is_ignored() {
        let mut config = ConverterConfig::new();
        config.apply_env_overrides(&env_from(&[(ENV_SQL_DIALECT, "cobol")]));
        assert_eq!(config.import.default_dialect, Dialect::Generic);
    }

    #[test]
    fn test_required_variable_names_missing_variable() {
        let env = env_from(&[("PRESENT", "x"), ("EMPTY", "")]);
        assert_eq!(env.required("PRESENT").unwrap(), "x");
        assert_eq!(
            env.required("EMPTY").unwrap_err(),
            ConfigError::MissingVariable {
                variable: "EMPTY".to_string()
            }
        );
        assert_eq!(
            env.required("ABSENT").unwrap_err().to_string(),
            "Missing required environment variable: ABSENT"
        );
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let config = ConverterConfig::new();
        let toml = config.to_toml().unwrap();
        let back = ConverterConfig::parse(&toml).unwrap();
        assert_eq!(back.import.title, config.import.title);
    }
}
