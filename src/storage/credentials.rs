//! Object storage credentials from the environment
//!
//! Credentials are only read here, never stored or refreshed. Secrets are
//! redacted whenever a credential value is formatted.

use crate::config::{ConfigResult, EnvLookup, ProcessEnv};
use crate::models::Server;
use std::fmt;

pub const ENV_S3_ACCESS_KEY_ID: &str = "DATACONTRACT_S3_ACCESS_KEY_ID";
pub const ENV_S3_SECRET_ACCESS_KEY: &str = "DATACONTRACT_S3_SECRET_ACCESS_KEY";
pub const ENV_S3_SESSION_TOKEN: &str = "DATACONTRACT_S3_SESSION_TOKEN";

pub const ENV_AZURE_CLIENT_ID: &str = "DATACONTRACT_AZURE_CLIENT_ID";
pub const ENV_AZURE_CLIENT_SECRET: &str = "DATACONTRACT_AZURE_CLIENT_SECRET";
pub const ENV_AZURE_TENANT_ID: &str = "DATACONTRACT_AZURE_TENANT_ID";

const REDACTED: &str = "***";

/// S3 access key credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl S3Credentials {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(&ProcessEnv)
    }

    /// Resolve all three variables, failing on the first missing one.
    pub fn from_lookup(env: &impl EnvLookup) -> ConfigResult<Self> {
        Ok(Self {
            access_key_id: env.required(ENV_S3_ACCESS_KEY_ID)?,
            secret_access_key: env.required(ENV_S3_SECRET_ACCESS_KEY)?,
            session_token: env.required(ENV_S3_SESSION_TOKEN)?,
        })
    }
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .field("session_token", &REDACTED)
            .finish()
    }
}

/// Azure service principal credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct AzureCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl AzureCredentials {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup(env: &impl EnvLookup) -> ConfigResult<Self> {
        Ok(Self {
            client_id: env.required(ENV_AZURE_CLIENT_ID)?,
            client_secret: env.required(ENV_AZURE_CLIENT_SECRET)?,
            tenant_id: env.required(ENV_AZURE_TENANT_ID)?,
        })
    }
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Credentials needed to read from a server's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCredentials {
    /// Local or otherwise unauthenticated access
    Anonymous,
    S3(S3Credentials),
    Azure {
        storage_account: Option<String>,
        credentials: AzureCredentials,
    },
}

impl StorageCredentials {
    /// Resolve what a server of this type needs.
    ///
    /// `s3` servers need the S3 variables, `azure` servers the Azure ones;
    /// anything else reads anonymously.
    pub fn for_server(server: &Server, env: &impl EnvLookup) -> ConfigResult<Self> {
        match server.server_type.as_deref() {
            Some("s3") => Ok(Self::S3(S3Credentials::from_lookup(env)?)),
            Some("azure") => Ok(Self::Azure {
                storage_account: server.storage_account.clone(),
                credentials: AzureCredentials::from_lookup(env)?,
            }),
            _ => Ok(Self::Anonymous),
        }
    }
}

impl fmt::Display for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::S3(c) => write!(f, "s3 access key {}", c.access_key_id),
            Self::Azure {
                storage_account,
                credentials,
            } => write!(
                f,
                "azure client {} on account {}",
                credentials.client_id,
                storage_account.as_deref().unwrap_or("<unknown>")
            ),
        }
    }
}
