// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote configuration property source adapter.
//!
//! This module provides a source that consults one or more remote settings
//! stores for a label-scoped setting and, when a setting turns out to be a
//! reference to a secret, swaps in the secret's value.

use crate::domain::{PropertyName, PropertyValue, Result};
use crate::ports::{PropertySource, RemoteSetting, SecretClient, SettingsClient};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Instrument, Span};

/// Which client's answer wins when several stores hold the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Every client is queried; the last non-empty answer wins.
    #[default]
    LastMatch,
    /// Clients are queried in order until one gives a non-empty answer.
    FirstMatch,
}

/// Property source backed by remote settings stores.
///
/// A lookup never fails because of a single store: per-client errors (network
/// failures, malformed secret references, missing secrets) are logged and that
/// client simply contributes no value.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::{MemorySettingsClient, RemoteConfigSource};
/// use chaincfg::domain::PropertyName;
/// use chaincfg::ports::{PropertySource, RemoteSetting};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let shared = MemorySettingsClient::new("memory://shared")
///     .with_setting("timeout", Some("production"), RemoteSetting::plain("30"));
/// let team = MemorySettingsClient::new("memory://team")
///     .with_setting("timeout", Some("production"), RemoteSetting::plain("45"));
///
/// let source = RemoteConfigSource::new()
///     .with_label("production")
///     .add_settings_client(Arc::new(shared))
///     .add_settings_client(Arc::new(team));
///
/// let name = PropertyName::new("timeout").unwrap();
/// let value = source.resolve_local(&name).await.unwrap();
/// assert_eq!(value.unwrap().as_str(), "45");
/// # }
/// ```
pub struct RemoteConfigSource {
    clients: Vec<Arc<dyn SettingsClient>>,
    secret_client: Option<Arc<dyn SecretClient>>,
    label: Option<String>,
    policy: MatchPolicy,
    span: Span,
}

impl RemoteConfigSource {
    /// Creates a source with no clients, no label and the default policy.
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
            secret_client: None,
            label: None,
            policy: MatchPolicy::default(),
            span: tracing::info_span!("remote_config"),
        }
    }

    /// Appends a settings store. Stores are queried in the order added.
    pub fn add_settings_client(mut self, client: Arc<dyn SettingsClient>) -> Self {
        self.clients.push(client);
        self
    }

    /// Sets the secret store used to dereference secret references.
    ///
    /// Without one, a secret reference resolves to its raw payload.
    pub fn set_secret_client(mut self, client: Arc<dyn SecretClient>) -> Self {
        self.secret_client = Some(client);
        self
    }

    /// Scopes every lookup to `label`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the policy applied when more than one store has the key.
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the span every lookup is recorded in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Number of settings stores.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// The label lookups are scoped to, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Turns one store's answer into a value, following secret references.
    async fn materialize(&self, name: &str, setting: RemoteSetting) -> Result<Option<String>> {
        if !setting.is_secret_reference() {
            return Ok(Some(setting.value));
        }

        let Some(secrets) = &self.secret_client else {
            tracing::debug!(name, "secret reference left unresolved: no secret store");
            return Ok(Some(setting.value));
        };

        let reference = setting.secret_reference()?;
        let secret = secrets.fetch_secret(&reference.uri).await?;
        tracing::debug!(name, secret_store = secrets.endpoint(), "secret reference resolved");
        Ok(Some(secret.value))
    }

    async fn query(&self, client: &dyn SettingsClient, name: &str) -> Result<Option<String>> {
        match client.fetch_setting(name, self.label.as_deref()).await? {
            Some(setting) => self.materialize(name, setting).await,
            None => Ok(None),
        }
    }

    async fn lookup(&self, name: &str) -> Option<PropertyValue> {
        let mut accumulated = None;

        for client in &self.clients {
            match self.query(client.as_ref(), name).await {
                Ok(Some(value)) if !value.is_empty() => {
                    tracing::trace!(name, endpoint = client.endpoint(), "remote value found");
                    accumulated = Some(PropertyValue::new(value));
                    if self.policy == MatchPolicy::FirstMatch {
                        break;
                    }
                }
                Ok(_) => {
                    tracing::trace!(name, endpoint = client.endpoint(), "no remote value");
                }
                Err(e) => {
                    tracing::info!(
                        name,
                        endpoint = client.endpoint(),
                        error = %e,
                        "remote lookup failed, skipping client"
                    );
                }
            }
        }

        accumulated
    }
}

impl Default for RemoteConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RemoteConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfigSource")
            .field(
                "clients",
                &self.clients.iter().map(|c| c.endpoint()).collect::<Vec<_>>(),
            )
            .field(
                "secret_client",
                &self.secret_client.as_ref().map(|c| c.endpoint()),
            )
            .field("label", &self.label)
            .field("policy", &self.policy)
            .finish()
    }
}

#[async_trait]
impl PropertySource for RemoteConfigSource {
    fn name(&self) -> &str {
        "remote"
    }

    async fn resolve_local(&self, name: &PropertyName) -> Result<Option<PropertyValue>> {
        Ok(self
            .lookup(name.as_str())
            .instrument(self.span.clone())
            .await)
    }
}
