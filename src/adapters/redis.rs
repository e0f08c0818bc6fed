// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis-backed remote settings and secret stores.
//!
//! Layout:
//!
//! - a setting lives in a hash at `{prefix}{key}` (unlabelled) or
//!   `{prefix}{key}@{label}`, with fields `value` and `content_type`;
//! - a secret lives in a string at `{prefix}{name}`, or
//!   `{prefix}{name}:{version}` for a pinned version, where name and version
//!   come from the secret URI (`.../secrets/{name}[/{version}]`).
//!
//! When a credential is supplied, its token is sent as the Redis password.

use crate::domain::{ConfigError, Endpoint, Result};
use crate::ports::{
    ClientFactory, RemoteSetting, Secret, SecretClient, SecretReference, SettingsClient,
    TokenCredential,
};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ConnectionInfo, IntoConnectionInfo};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Scope requested from credentials used against Redis.
const TOKEN_SCOPE: &str = "redis";

fn redis_error(message: &str, err: redis::RedisError) -> ConfigError {
    ConfigError::source_error("redis", format!("{}: {}", message, err), err)
}

/// Validates a key prefix to prevent injection attacks
fn validate_prefix(prefix: &str) -> Result<()> {
    // Disallow wildcard characters and other special Redis pattern characters
    if prefix.contains(['*', '?', '[', ']', '\\']) {
        return Err(ConfigError::SourceError {
            source_name: "redis".to_string(),
            message: "Prefix contains invalid characters (* ? [ ] \\)".to_string(),
            source: None,
        });
    }
    Ok(())
}

/// Lazily opened, shared connection to one Redis endpoint.
struct RedisConnector {
    url: String,
    info: ConnectionInfo,
    credential: Option<Arc<dyn TokenCredential>>,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisConnector {
    fn new(url: &str, credential: Option<Arc<dyn TokenCredential>>) -> Result<Self> {
        let info = url
            .into_connection_info()
            .map_err(|e| redis_error("Invalid Redis URL", e))?;
        Ok(Self {
            url: url.to_string(),
            info,
            credential,
            connection: OnceCell::new(),
        })
    }

    async fn open(&self) -> Result<MultiplexedConnection> {
        let mut info = self.info.clone();
        if let Some(credential) = &self.credential {
            let token = credential.get_token(TOKEN_SCOPE).await?;
            info.redis.password = Some(token.token);
        }

        let client = Client::open(info).map_err(|e| redis_error("Failed to create Redis client", e))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| redis_error("Failed to connect to Redis", e))?;
        tracing::debug!(endpoint = %self.url, "connected to redis");
        Ok(connection)
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.connection
            .get_or_try_init(|| self.open())
            .await
            .cloned()
    }
}

/// Settings store backed by Redis hashes.
///
/// # Examples
///
/// ```rust,no_run
/// use chaincfg::adapters::RedisSettingsClient;
/// use chaincfg::ports::SettingsClient;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisSettingsClient::new("redis://localhost:6379", "config:")?;
/// let setting = client.fetch_setting("db-host", Some("production")).await?;
/// # Ok(())
/// # }
/// ```
pub struct RedisSettingsClient {
    connector: RedisConnector,
    prefix: String,
}

impl RedisSettingsClient {
    /// Creates a client for `url` reading hashes under `prefix`.
    ///
    /// No connection is made until the first fetch.
    pub fn new(url: &str, prefix: &str) -> Result<Self> {
        Self::build(url, prefix, None)
    }

    /// Creates a client that authenticates with `credential`'s token.
    pub fn with_credential(
        url: &str,
        prefix: &str,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        Self::build(url, prefix, Some(credential))
    }

    fn build(url: &str, prefix: &str, credential: Option<Arc<dyn TokenCredential>>) -> Result<Self> {
        validate_prefix(prefix)?;
        Ok(Self {
            connector: RedisConnector::new(url, credential)?,
            prefix: prefix.to_string(),
        })
    }

    /// The Redis key holding `key` for `label`.
    pub fn storage_key(&self, key: &str, label: Option<&str>) -> String {
        match label {
            Some(label) => format!("{}{}@{}", self.prefix, key, label),
            None => format!("{}{}", self.prefix, key),
        }
    }
}

#[async_trait]
impl SettingsClient for RedisSettingsClient {
    fn endpoint(&self) -> &str {
        &self.connector.url
    }

    async fn fetch_setting(&self, key: &str, label: Option<&str>) -> Result<Option<RemoteSetting>> {
        let mut conn = self.connector.connection().await?;
        let storage_key = self.storage_key(key, label);

        let mut fields: HashMap<String, String> = conn
            .hgetall(&storage_key)
            .await
            .map_err(|e| redis_error("Failed to fetch setting from Redis", e))?;

        Ok(fields.remove("value").map(|value| RemoteSetting {
            value,
            content_type: fields.remove("content_type"),
        }))
    }
}

/// Secret store backed by Redis strings.
pub struct RedisSecretClient {
    connector: RedisConnector,
    prefix: String,
}

impl RedisSecretClient {
    /// Creates a client for `url` reading secrets under `prefix`.
    pub fn new(url: &str, prefix: &str) -> Result<Self> {
        Self::build(url, prefix, None)
    }

    /// Creates a client that authenticates with `credential`'s token.
    pub fn with_credential(
        url: &str,
        prefix: &str,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        Self::build(url, prefix, Some(credential))
    }

    fn build(url: &str, prefix: &str, credential: Option<Arc<dyn TokenCredential>>) -> Result<Self> {
        validate_prefix(prefix)?;
        Ok(Self {
            connector: RedisConnector::new(url, credential)?,
            prefix: prefix.to_string(),
        })
    }

    /// The Redis key holding the secret at `uri`.
    pub fn storage_key(&self, uri: &str) -> String {
        let reference = SecretReference {
            uri: uri.to_string(),
        };
        match reference.name_and_version() {
            (name, Some(version)) => format!("{}{}:{}", self.prefix, name, version),
            (name, None) => format!("{}{}", self.prefix, name),
        }
    }
}

#[async_trait]
impl SecretClient for RedisSecretClient {
    fn endpoint(&self) -> &str {
        &self.connector.url
    }

    async fn fetch_secret(&self, uri: &str) -> Result<Secret> {
        let mut conn = self.connector.connection().await?;
        let storage_key = self.storage_key(uri);

        let value: Option<String> = conn
            .get(&storage_key)
            .await
            .map_err(|e| redis_error("Failed to fetch secret from Redis", e))?;

        value
            .map(|value| Secret { value })
            .ok_or_else(|| ConfigError::SourceError {
                source_name: "redis".to_string(),
                message: format!("Secret not found: {}", storage_key),
                source: None,
            })
    }
}

/// Builds Redis clients for configured endpoints.
#[derive(Debug, Clone, Default)]
pub struct RedisClientFactory {
    settings_prefix: String,
    secret_prefix: String,
}

impl RedisClientFactory {
    /// Creates a factory with the given key prefixes.
    pub fn new(settings_prefix: impl Into<String>, secret_prefix: impl Into<String>) -> Self {
        Self {
            settings_prefix: settings_prefix.into(),
            secret_prefix: secret_prefix.into(),
        }
    }
}

impl ClientFactory for RedisClientFactory {
    fn settings_client(
        &self,
        endpoint: &Endpoint,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Arc<dyn SettingsClient>> {
        Ok(Arc::new(RedisSettingsClient::with_credential(
            &endpoint.url,
            &self.settings_prefix,
            credential,
        )?))
    }

    fn secret_client(
        &self,
        endpoint: &Endpoint,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Arc<dyn SecretClient>> {
        Ok(Arc::new(RedisSecretClient::with_credential(
            &endpoint.url,
            &self.secret_prefix,
            credential,
        )?))
    }
}
