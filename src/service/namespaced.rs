// SPDX-License-Identifier: MIT OR Apache-2.0

//! A resolver view that scopes every name under a namespace.

use crate::domain::{PropertyName, PropertyResolver, PropertyValue, Result, Reviver};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Delimiter placed between namespace and local name unless told otherwise.
pub const DEFAULT_DELIMITER: &str = "-";

/// Prefixes every lookup with `{namespace}{delimiter}` before delegating.
///
/// The view holds no state besides its parent and prefix, so it can be created
/// freely, one per consumer. It works over any resolver, including a cached
/// one, in which case the cache is keyed by the full scoped name.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::EnvVarSource;
/// use chaincfg::domain::PropertyResolver;
/// use chaincfg::service::{NamespacedProperties, Properties};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let env = EnvVarSource::with_values(HashMap::from([
///     ("jwt-issuer".to_string(), "https://issuer.example".to_string()),
/// ]));
/// let jwt = NamespacedProperties::new(Arc::new(Properties::new(env)), "jwt");
///
/// let issuer = jwt.get_property("issuer", None).await.unwrap();
/// assert_eq!(issuer.unwrap().as_str(), "https://issuer.example");
/// # }
/// ```
#[derive(Clone)]
pub struct NamespacedProperties {
    parent: Arc<dyn PropertyResolver>,
    namespace: String,
    delimiter: String,
}

impl NamespacedProperties {
    /// Creates a view of `parent` under `namespace` with the default delimiter.
    pub fn new(parent: Arc<dyn PropertyResolver>, namespace: impl Into<String>) -> Self {
        Self::with_delimiter(parent, namespace, DEFAULT_DELIMITER)
    }

    /// Creates a view of `parent` under `namespace` joined by `delimiter`.
    pub fn with_delimiter(
        parent: Arc<dyn PropertyResolver>,
        namespace: impl Into<String>,
        delimiter: impl Into<String>,
    ) -> Self {
        Self {
            parent,
            namespace: namespace.into(),
            delimiter: delimiter.into(),
        }
    }

    /// The namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The delimiter.
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// The full name `local` is looked up under.
    pub fn scoped_name(&self, local: &str) -> Result<PropertyName> {
        PropertyName::scoped(&self.namespace, &self.delimiter, local)
    }
}

impl std::fmt::Debug for NamespacedProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedProperties")
            .field("namespace", &self.namespace)
            .field("delimiter", &self.delimiter)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PropertyResolver for NamespacedProperties {
    async fn get_property(
        &self,
        name: &str,
        default: Option<&str>,
    ) -> Result<Option<PropertyValue>> {
        let scoped = self.scoped_name(name)?;
        self.parent.get_property(scoped.as_str(), default).await
    }

    async fn get_object(
        &self,
        name: &str,
        default: Option<Value>,
        reviver: Option<Reviver>,
    ) -> Result<Option<Value>> {
        let scoped = self.scoped_name(name)?;
        self.parent
            .get_object(scoped.as_str(), default, reviver)
            .await
    }

    async fn get_timestamp(
        &self,
        name: &str,
        default: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>> {
        let scoped = self.scoped_name(name)?;
        self.parent.get_timestamp(scoped.as_str(), default).await
    }
}
