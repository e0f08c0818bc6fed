// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory remote settings and secret stores.
//!
//! These clients hold their data in process memory. They stand in for real
//! remote stores in tests and local development, and count the calls they
//! receive so that callers can observe how often an origin was consulted.

use crate::domain::{ConfigError, Result};
use crate::ports::{RemoteSetting, Secret, SecretClient, SettingsClient};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A settings store kept in memory.
///
/// Settings are keyed by `(key, label)`; a setting inserted without a label
/// only answers unlabelled lookups.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::MemorySettingsClient;
/// use chaincfg::ports::{RemoteSetting, SettingsClient};
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = MemorySettingsClient::new("memory://primary")
///     .with_setting("db-host", Some("production"), RemoteSetting::plain("db.internal"));
///
/// let setting = client.fetch_setting("db-host", Some("production")).await.unwrap();
/// assert_eq!(setting.unwrap().value, "db.internal");
/// assert!(client.fetch_setting("db-host", None).await.unwrap().is_none());
/// assert_eq!(client.calls(), 2);
/// # }
/// ```
#[derive(Debug)]
pub struct MemorySettingsClient {
    endpoint: String,
    settings: RwLock<HashMap<(String, Option<String>), RemoteSetting>>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl MemorySettingsClient {
    /// Creates an empty store identified by `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            settings: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Adds a setting, builder style.
    pub fn with_setting(self, key: &str, label: Option<&str>, setting: RemoteSetting) -> Self {
        self.insert(key, label, setting);
        self
    }

    /// Adds or replaces a setting.
    pub fn insert(&self, key: &str, label: Option<&str>, setting: RemoteSetting) {
        self.settings
            .write()
            .insert((key.to_string(), label.map(str::to_string)), setting);
    }

    /// Removes a setting.
    pub fn remove(&self, key: &str, label: Option<&str>) {
        self.settings
            .write()
            .remove(&(key.to_string(), label.map(str::to_string)));
    }

    /// Makes every subsequent fetch fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    /// Makes fetches succeed again.
    pub fn recover(&self) {
        *self.failure.write() = None;
    }

    /// Number of fetches received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsClient for MemorySettingsClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_setting(&self, key: &str, label: Option<&str>) -> Result<Option<RemoteSetting>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.read().clone() {
            return Err(ConfigError::SourceError {
                source_name: self.endpoint.clone(),
                message,
                source: None,
            });
        }

        Ok(self
            .settings
            .read()
            .get(&(key.to_string(), label.map(str::to_string)))
            .cloned())
    }
}

/// A secret store kept in memory, keyed by secret URI.
#[derive(Debug)]
pub struct MemorySecretClient {
    endpoint: String,
    secrets: RwLock<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl MemorySecretClient {
    /// Creates an empty store identified by `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            secrets: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Adds a secret, builder style.
    pub fn with_secret(self, uri: &str, value: &str) -> Self {
        self.insert(uri, value);
        self
    }

    /// Adds or replaces a secret.
    pub fn insert(&self, uri: &str, value: &str) {
        self.secrets
            .write()
            .insert(uri.to_string(), value.to_string());
    }

    /// Number of fetches received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretClient for MemorySecretClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_secret(&self, uri: &str) -> Result<Secret> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .read()
            .get(uri)
            .map(|value| Secret {
                value: value.clone(),
            })
            .ok_or_else(|| ConfigError::SourceError {
                source_name: self.endpoint.clone(),
                message: format!("secret not found: {}", uri),
                source: None,
            })
    }
}
