// SPDX-License-Identifier: MIT OR Apache-2.0

//! The property manager: assembles sources, caching and namespaced views.

use crate::adapters::{EnvVarSource, MatchPolicy, RemoteConfigSource};
use crate::domain::{
    ConfigError, PropertyManagerSettings, PropertyResolver, PropertyValue, RemoteConfigSettings,
    Result, Reviver,
};
use crate::ports::{ClientFactory, CredentialProvider, PropertySource};
use crate::service::cached::CachedProperties;
use crate::service::chain::SourceChain;
use crate::service::context::RuntimeContext;
use crate::service::namespaced::{NamespacedProperties, DEFAULT_DELIMITER};
use crate::service::properties::Properties;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::Span;

/// Component name used to locate the manager's settings file.
pub const SETTINGS_COMPONENT: &str = "PropertyManager";

/// The composition root for property resolution.
///
/// The chain always starts with the environment source. When the settings
/// enable remote configuration, a [`RemoteConfigSource`] follows, then any
/// sources registered with [`PropertyManagerBuilder::with_source`]. When the
/// settings enable caching, the whole chain sits behind a [`CachedProperties`].
///
/// In the `local` environment, settings are ignored and only the environment
/// source (plus registered sources) is used.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::EnvVarSource;
/// use chaincfg::domain::{PropertyManagerSettings, PropertyResolver};
/// use chaincfg::service::{PropertyManager, RuntimeContext};
/// use std::collections::HashMap;
///
/// # #[tokio::main]
/// # async fn main() -> chaincfg::domain::Result<()> {
/// let settings = PropertyManagerSettings::from_json_str(
///     r#"{ "cacheControls": { "cache": true, "maxAge": "1m" } }"#,
/// )?;
///
/// let manager = PropertyManager::builder()
///     .with_context(RuntimeContext::new().with_value("environment", "staging"))
///     .with_env_source(EnvVarSource::with_values(HashMap::from([
///         ("jwt-issuer".to_string(), "https://issuer.example".to_string()),
///     ])))
///     .with_settings(settings)
///     .build()?;
///
/// let jwt = manager.namespace("jwt");
/// let issuer = jwt.get_property("issuer", None).await?;
/// assert_eq!(issuer.unwrap().as_str(), "https://issuer.example");
/// assert!(manager.cache().is_some());
/// # Ok(())
/// # }
/// ```
pub struct PropertyManager {
    resolver: Arc<dyn PropertyResolver>,
    cache: Option<CachedProperties>,
    context: RuntimeContext,
    sources: Vec<String>,
}

impl PropertyManager {
    /// Creates a builder.
    pub fn builder() -> PropertyManagerBuilder {
        PropertyManagerBuilder::new()
    }

    /// The assembled resolver (cached, if caching is enabled).
    pub fn properties(&self) -> Arc<dyn PropertyResolver> {
        Arc::clone(&self.resolver)
    }

    /// The caching layer, if caching is enabled.
    pub fn cache(&self) -> Option<&CachedProperties> {
        self.cache.as_ref()
    }

    /// The runtime context the manager was built with.
    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    /// Names of the chained sources, in lookup order.
    pub fn source_names(&self) -> &[String] {
        &self.sources
    }

    /// A view scoping every name under `{name}-`.
    pub fn namespace(&self, name: &str) -> NamespacedProperties {
        self.namespace_with_delimiter(name, DEFAULT_DELIMITER)
    }

    /// A view scoping every name under `{name}{delimiter}`.
    pub fn namespace_with_delimiter(&self, name: &str, delimiter: &str) -> NamespacedProperties {
        NamespacedProperties::with_delimiter(self.properties(), name, delimiter)
    }
}

impl std::fmt::Debug for PropertyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyManager")
            .field("environment", &self.context.environment())
            .field("sources", &self.sources)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PropertyResolver for PropertyManager {
    async fn get_property(
        &self,
        name: &str,
        default: Option<&str>,
    ) -> Result<Option<PropertyValue>> {
        self.resolver.get_property(name, default).await
    }

    async fn get_object(
        &self,
        name: &str,
        default: Option<Value>,
        reviver: Option<Reviver>,
    ) -> Result<Option<Value>> {
        self.resolver.get_object(name, default, reviver).await
    }

    async fn get_timestamp(
        &self,
        name: &str,
        default: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>> {
        self.resolver.get_timestamp(name, default).await
    }
}

/// Builder for [`PropertyManager`].
pub struct PropertyManagerBuilder {
    settings: Option<PropertyManagerSettings>,
    context: RuntimeContext,
    credentials: Option<Arc<dyn CredentialProvider>>,
    factory: Option<Arc<dyn ClientFactory>>,
    env_source: Option<Box<dyn PropertySource>>,
    sources: Vec<Box<dyn PropertySource>>,
    policy: MatchPolicy,
    span: Option<Span>,
}

impl PropertyManagerBuilder {
    /// Creates a builder with no settings and the default runtime context.
    pub fn new() -> Self {
        Self {
            settings: None,
            context: RuntimeContext::new(),
            credentials: None,
            factory: None,
            env_source: None,
            sources: Vec::new(),
            policy: MatchPolicy::default(),
            span: None,
        }
    }

    /// Uses `settings` for caching and remote configuration.
    pub fn with_settings(mut self, settings: PropertyManagerSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Loads settings from `path`.
    pub fn with_settings_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let settings = PropertyManagerSettings::from_file(path)?;
        Ok(self.with_settings(settings))
    }

    /// Loads settings from the file the runtime context points at, if it exists.
    ///
    /// A missing file leaves the builder without settings.
    pub fn with_context_settings(self) -> Result<Self> {
        let path = self.context.settings_path(SETTINGS_COMPONENT);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file found, using defaults");
            return Ok(self);
        }
        self.with_settings_file(path)
    }

    /// Uses `context` instead of the default `api-` context.
    pub fn with_context(mut self, context: RuntimeContext) -> Self {
        self.context = context;
        self
    }

    /// Pins the environment name, shadowing `{prefix}environment`.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.context = self.context.with_value("environment", environment);
        self
    }

    /// Supplies credentials for remote endpoints.
    pub fn with_credential_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Supplies the factory that turns endpoints into remote clients.
    pub fn with_client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Replaces the environment source at the head of the chain.
    pub fn with_env_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.env_source = Some(Box::new(source));
        self
    }

    /// Appends a source after the built-in ones. Sources keep registration order.
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Sets the match policy of the remote configuration source.
    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the parent span for every component the manager builds.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    fn remote_source(
        &self,
        remote: &RemoteConfigSettings,
        span: &Span,
    ) -> Result<Option<RemoteConfigSource>> {
        if !remote.enabled {
            tracing::debug!("remote configuration disabled");
            return Ok(None);
        }
        if remote.endpoints.is_empty() {
            tracing::debug!("remote configuration enabled without endpoints");
            return Ok(None);
        }

        let (Some(credentials), Some(factory)) = (&self.credentials, &self.factory) else {
            return Err(ConfigError::InvalidConfiguration {
                message: "remote configuration requires a credential provider and a client factory"
                    .to_string(),
            });
        };

        let mut source = RemoteConfigSource::new()
            .with_label(self.context.environment())
            .with_policy(self.policy)
            .with_span(tracing::info_span!(parent: span, "remote_config"));

        for endpoint in &remote.endpoints {
            tracing::debug!(url = %endpoint.url, "adding remote settings endpoint");
            let credential = credentials.get_credential(&endpoint.identity)?;
            source = source.add_settings_client(factory.settings_client(endpoint, credential)?);
        }

        match &remote.secret_vault {
            Some(vault) if vault.follow_references => match &vault.endpoint {
                Some(endpoint) => {
                    tracing::debug!(url = %endpoint.url, "following secret references");
                    let credential = credentials.get_credential(&endpoint.identity)?;
                    source = source.set_secret_client(factory.secret_client(endpoint, credential)?);
                }
                None => tracing::debug!("secret references enabled without an endpoint"),
            },
            _ => tracing::debug!("secret references not followed"),
        }

        Ok(Some(source))
    }

    /// Assembles the manager.
    ///
    /// # Errors
    ///
    /// Fails if remote configuration is enabled without a credential provider
    /// or client factory, if a credential or client cannot be created, or if a
    /// cache override names an empty property.
    pub fn build(mut self) -> Result<PropertyManager> {
        let environment = self.context.environment();
        let span = self
            .span
            .take()
            .unwrap_or_else(|| tracing::info_span!("property_manager", environment = %environment));

        let env_source = self
            .env_source
            .take()
            .unwrap_or_else(|| Box::new(EnvVarSource::new()));
        let mut chain = SourceChain::from_boxed(env_source);

        let settings = if self.context.is_local() {
            tracing::debug!(parent: &span, "local environment, using the environment source only");
            None
        } else {
            self.settings.take()
        };

        if let Some(remote) = settings.as_ref().and_then(|s| s.remote_config.as_ref()) {
            if let Some(source) = self.remote_source(remote, &span)? {
                chain.add_link(Box::new(source));
            }
        }

        for source in self.sources.drain(..) {
            tracing::debug!(parent: &span, source = source.name(), "registering property source");
            chain.add_link(source);
        }

        let sources = chain
            .source_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let properties = Properties::from_chain(chain)
            .with_span(tracing::info_span!(parent: &span, "properties"));
        let mut resolver: Arc<dyn PropertyResolver> = Arc::new(properties);

        let mut cache = None;
        match settings.as_ref().and_then(|s| s.cache_controls.as_ref()) {
            Some(controls) if controls.cache => {
                let cached = CachedProperties::with_span(
                    resolver,
                    controls.max_age,
                    tracing::info_span!(parent: &span, "cached_properties"),
                );
                for policy in &controls.overrides {
                    cached.set_cache(&policy.name, policy.cache, policy.max_age)?;
                }
                resolver = Arc::new(cached.clone());
                cache = Some(cached);
            }
            Some(_) => tracing::debug!(parent: &span, "caching disabled"),
            None => tracing::debug!(parent: &span, "no cache controls, caching disabled"),
        }

        tracing::info!(parent: &span, sources = ?sources, cached = cache.is_some(), "property manager ready");
        Ok(PropertyManager {
            resolver,
            cache,
            context: self.context,
            sources,
        })
    }
}

impl Default for PropertyManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvVarSource {
        EnvVarSource::with_values(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_defaults_to_environment_only() {
        let manager = PropertyManager::builder()
            .with_environment("development")
            .with_env_source(env(&[("k", "v")]))
            .build()
            .unwrap();

        assert_eq!(manager.source_names(), ["env"]);
        assert!(manager.cache().is_none());
        assert_eq!(
            manager.get_property("k", None).await.unwrap(),
            Some(PropertyValue::from("v"))
        );
    }

    #[test]
    fn test_remote_without_factory_is_rejected() {
        let settings = PropertyManagerSettings::from_json_str(
            r#"{ "remoteConfig": { "enabled": true, "endpoints": [ { "url": "memory://a" } ] } }"#,
        )
        .unwrap();

        let result = PropertyManager::builder()
            .with_environment("production")
            .with_env_source(env(&[]))
            .with_settings(settings)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_local_environment_ignores_settings() {
        let settings = PropertyManagerSettings::from_json_str(
            r#"{ "cacheControls": { "cache": true },
                 "remoteConfig": { "enabled": true, "endpoints": [ { "url": "memory://a" } ] } }"#,
        )
        .unwrap();

        let manager = PropertyManager::builder()
            .with_environment("local")
            .with_env_source(env(&[]))
            .with_settings(settings)
            .build()
            .unwrap();
        assert!(manager.cache().is_none());
        assert_eq!(manager.source_names(), ["env"]);
    }

    #[test]
    fn test_cache_overrides_are_registered() {
        let settings = PropertyManagerSettings::from_json_str(
            r#"{ "cacheControls": { "cache": true, "maxAge": "10m",
                 "overrides": [ { "name": "flags", "cache": false }, { "name": "banner" } ] } }"#,
        )
        .unwrap();

        let manager = PropertyManager::builder()
            .with_environment("development")
            .with_env_source(env(&[]))
            .with_settings(settings)
            .build()
            .unwrap();
        let cache = manager.cache().unwrap();
        assert!(!cache.cache_entry("flags").unwrap().is_enabled());
        assert_eq!(
            cache.cache_entry("banner").unwrap().max_age(),
            std::time::Duration::from_secs(600)
        );
    }

    #[tokio::test]
    async fn test_registered_sources_follow_environment() {
        let manager = PropertyManager::builder()
            .with_environment("development")
            .with_env_source(env(&[("shared", "from-env")]))
            .with_source(env(&[("shared", "from-late"), ("late-only", "yes")]))
            .build()
            .unwrap();

        assert_eq!(manager.source_names(), ["env", "env"]);
        assert_eq!(
            manager.get_property("shared", None).await.unwrap(),
            Some(PropertyValue::from("from-env"))
        );
        assert_eq!(
            manager.get_property("late-only", None).await.unwrap(),
            Some(PropertyValue::from("yes"))
        );
    }

    #[tokio::test]
    async fn test_namespace_with_delimiter() {
        let manager = PropertyManager::builder()
            .with_environment("development")
            .with_env_source(env(&[("db.host", "localhost")]))
            .build()
            .unwrap();

        let db = manager.namespace_with_delimiter("db", ".");
        assert_eq!(
            db.get_property("host", None).await.unwrap(),
            Some(PropertyValue::from("localhost"))
        );
    }
}
