//! Quality engine connection configuration
//!
//! Renders the `data_source` YAML block a Soda-style quality engine expects
//! for a contract server. Usernames and passwords come from the environment
//! as `DATACONTRACT_<TYPE>_USERNAME` / `DATACONTRACT_<TYPE>_PASSWORD` and are
//! rendered empty when unset.

use crate::config::{EnvLookup, ProcessEnv};
use crate::models::Server;
use indexmap::IndexMap;
use serde_yaml::Value;

/// Server types a connection configuration can be rendered for.
pub const SUPPORTED_SERVER_TYPES: [&str; 4] = ["db2", "postgres", "mysql", "sqlserver"];

/// Errors raised while rendering a connection configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    #[error("No connection configuration for server type '{0}'")]
    UnsupportedServerType(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Render with credentials from the process environment.
pub fn render_connection_config_from_env(server: &Server) -> Result<String, ConnectionError> {
    render_connection_config(server, &ProcessEnv)
}

/// Render the connection block for `server`.
///
/// ```rust
/// use data_contract_sdk::connections::render_connection_config;
/// use data_contract_sdk::models::Server;
///
/// let server = Server::new("db2").with_host("127.0.0.1").with_port(50000);
/// let env = |name: &str| (name == "DATACONTRACT_DB2_USERNAME").then(|| "simple".to_string());
/// let yaml = render_connection_config(&server, &env).unwrap();
/// assert!(yaml.contains("data_source db2:"));
/// assert!(yaml.contains("username: simple"));
/// assert!(yaml.contains("port: '50000'"));
/// ```
pub fn render_connection_config(
    server: &Server,
    env: &impl EnvLookup,
) -> Result<String, ConnectionError> {
    let server_type = server.server_type.as_deref().unwrap_or_default();
    if !SUPPORTED_SERVER_TYPES.contains(&server_type) {
        return Err(ConnectionError::UnsupportedServerType(
            server_type.to_string(),
        ));
    }

    let prefix = format!("DATACONTRACT_{}", server_type.to_uppercase());
    let username = env.var(&format!("{}_USERNAME", prefix)).unwrap_or_default();
    let password = env.var(&format!("{}_PASSWORD", prefix)).unwrap_or_default();

    let mut source: IndexMap<&str, Value> = IndexMap::new();
    source.insert("type", server_type.into());
    insert_opt(&mut source, "host", server.host.as_deref());
    match (server_type, server.port) {
        // DB2 expects the port as a string
        ("db2", Some(port)) => {
            source.insert("port", port.to_string().into());
        }
        (_, Some(port)) => {
            source.insert("port", port.into());
        }
        (_, None) => {}
    }
    source.insert("username", username.into());
    source.insert("password", password.into());
    insert_opt(&mut source, "database", server.database.as_deref());
    if server_type != "mysql" {
        insert_opt(&mut source, "schema", server.schema.as_deref());
    }
    if server_type == "sqlserver" {
        insert_opt(&mut source, "driver", server.driver.as_deref());
    }

    let mut root: IndexMap<String, IndexMap<&str, Value>> = IndexMap::new();
    root.insert(format!("data_source {}", server_type), source);

    tracing::debug!("Rendered {} connection configuration", server_type);
    serde_yaml::to_string(&root).map_err(|e| ConnectionError::Serialization(e.to_string()))
}

fn insert_opt(source: &mut IndexMap<&'static str, Value>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        source.insert(key, value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_postgres_config() {
        let server = Server::new("postgres")
            .with_host("localhost")
            .with_port(5432)
            .with_database("shop")
            .with_schema("public");
        let env = |name: &str| match name {
            "DATACONTRACT_POSTGRES_USERNAME" => Some("app".to_string()),
            "DATACONTRACT_POSTGRES_PASSWORD" => Some("pw".to_string()),
            _ => None,
        };
        let yaml = render_connection_config(&server, &env).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let source = &parsed["data_source postgres"];
        assert_eq!(source["type"], Value::from("postgres"));
        assert_eq!(source["port"], Value::from(5432));
        assert_eq!(source["username"], Value::from("app"));
        assert_eq!(source["password"], Value::from("pw"));
        assert_eq!(source["schema"], Value::from("public"));
    }

    #[test]
    fn test_missing_credentials_render_empty() {
        let server = Server::new("db2").with_host("127.0.0.1").with_port(50000);
        let yaml = render_connection_config(&server, &no_env).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let source = &parsed["data_source db2"];
        assert_eq!(source["username"], Value::from(""));
        assert_eq!(source["port"], Value::from("50000"));
        assert!(source.get("database").is_none());
    }

    #[test]
    fn test_unsupported_server_type() {
        let err = render_connection_config(&Server::new("kafka"), &no_env).unwrap_err();
        assert_eq!(
            err,
            ConnectionError::UnsupportedServerType("kafka".to_string())
        );
    }
}
