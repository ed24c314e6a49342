//! Storage reader and credential tests

use data_contract_sdk::config::ConfigError;
use data_contract_sdk::connections::render_connection_config;
use data_contract_sdk::models::Server;
use data_contract_sdk::storage::credentials::{ENV_S3_ACCESS_KEY_ID, S3Credentials};
use data_contract_sdk::storage::{
    LocalStorageReader, StorageCredentials, StorageError, StorageHandle, StorageReader, read_all,
};
use std::collections::HashMap;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

fn setup_files() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("b.json"), br#"{"id": 2}"#).unwrap();
    std::fs::write(dir.path().join("a.json"), br#"{"id": 1}"#).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignore").unwrap();
    std::fs::write(dir.path().join("nested").join("c.json"), br#"{"id": 3}"#).unwrap();
    dir
}

#[tokio::test]
async fn test_list_matches_glob_in_order() {
    let dir = setup_files();
    let reader = LocalStorageReader::with_base(dir.path());

    let handles = reader.list("*.json").await.unwrap();
    let names: Vec<String> = handles
        .iter()
        .map(|h| {
            std::path::Path::new(h.location())
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(names, vec!["a.json", "b.json"]);

    let recursive = reader.list("**/*.json").await.unwrap();
    assert_eq!(recursive.len(), 3);
}

#[tokio::test]
async fn test_read_all() {
    let dir = setup_files();
    let reader = LocalStorageReader::with_base(dir.path());
    let files = read_all(&reader, "*.json").await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].1, br#"{"id": 1}"#.to_vec());
}

#[tokio::test]
async fn test_read_missing_file() {
    let reader = LocalStorageReader::new();
    let err = reader
        .read(&StorageHandle::new("/definitely/missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_invalid_pattern() {
    let reader = LocalStorageReader::new();
    let err = reader.list("[unclosed").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidPattern { .. }));
}

#[test]
fn test_missing_credential_names_variable() {
    let server = Server::new("s3").with_location("s3://bucket/orders/*.json");
    let err = StorageCredentials::for_server(&server, &env(&[])).unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingVariable {
            variable: ENV_S3_ACCESS_KEY_ID.to_string()
        }
    );
    let storage_err: StorageError = err.into();
    assert!(storage_err.to_string().contains(ENV_S3_ACCESS_KEY_ID));
}

#[test]
fn test_s3_credentials_resolve() {
    let lookup = env(&[
        ("DATACONTRACT_S3_ACCESS_KEY_ID", "AKIA123"),
        ("DATACONTRACT_S3_SECRET_ACCESS_KEY", "secret"),
        ("DATACONTRACT_S3_SESSION_TOKEN", "token"),
    ]);
    let creds = S3Credentials::from_lookup(&lookup).unwrap();
    assert_eq!(creds.access_key_id, "AKIA123");
    let shown = StorageCredentials::S3(creds).to_string();
    assert!(shown.contains("AKIA123"));
    assert!(!shown.contains("secret"));
}

#[test]
fn test_connection_config_for_sqlserver() {
    let mut server = Server::new("sqlserver")
        .with_host("sql.example.com")
        .with_port(1433)
        .with_database("shop")
        .with_schema("dbo");
    server.driver = Some("ODBC Driver 18 for SQL Server".to_string());
    let lookup = env(&[("DATACONTRACT_SQLSERVER_USERNAME", "sa")]);

    let yaml = render_connection_config(&server, &lookup).unwrap();
    assert!(yaml.starts_with("data_source sqlserver:"));
    assert!(yaml.contains("username: sa"));
    assert!(yaml.contains("driver: ODBC Driver 18 for SQL Server"));
}
