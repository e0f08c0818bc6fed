// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plain resolver over a source chain.

use crate::domain::resolver::or_default;
use crate::domain::{PropertyName, PropertyResolver, PropertyValue, Result, Reviver};
use crate::ports::PropertySource;
use crate::service::chain::SourceChain;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{Instrument, Span};

/// Resolves properties by walking a [`SourceChain`].
///
/// No caching happens here; every call consults the chain. Wrap it in a
/// [`CachedProperties`](crate::service::CachedProperties) for that.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::EnvVarSource;
/// use chaincfg::domain::PropertyResolver;
/// use chaincfg::service::Properties;
/// use std::collections::HashMap;
///
/// # #[tokio::main]
/// # async fn main() {
/// let env = EnvVarSource::with_values(HashMap::from([
///     ("retry-policy".to_string(), r#"{"attempts": 3}"#.to_string()),
/// ]));
/// let properties = Properties::new(env);
///
/// let policy = properties.get_object("retry-policy", None, None).await.unwrap();
/// assert_eq!(policy.unwrap()["attempts"], 3);
///
/// let level = properties.get_property("log-level", Some("info")).await.unwrap();
/// assert_eq!(level.unwrap().as_str(), "info");
/// # }
/// ```
#[derive(Debug)]
pub struct Properties {
    chain: SourceChain,
    span: Span,
}

impl Properties {
    /// Creates a resolver whose chain starts with `source`.
    pub fn new(source: impl PropertySource + 'static) -> Self {
        Self::from_chain(SourceChain::new(source))
    }

    /// Creates a resolver over an assembled chain.
    pub fn from_chain(chain: SourceChain) -> Self {
        Self {
            chain,
            span: tracing::info_span!("properties"),
        }
    }

    /// Sets the span lookups are recorded in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Appends `source` to the end of the chain.
    pub fn add_source(&mut self, source: Box<dyn PropertySource>) {
        self.chain.add_link(source);
    }

    /// The underlying chain.
    pub fn chain(&self) -> &SourceChain {
        &self.chain
    }

    async fn lookup(&self, name: &str) -> Result<Option<PropertyValue>> {
        let name = PropertyName::new(name)?;
        let value = self
            .chain
            .resolve(&name)
            .instrument(self.span.clone())
            .await?;
        if value.is_none() {
            self.span.in_scope(|| {
                tracing::info!(property = %name, "no value found for property");
            });
        }
        Ok(value)
    }
}

#[async_trait]
impl PropertyResolver for Properties {
    async fn get_property(
        &self,
        name: &str,
        default: Option<&str>,
    ) -> Result<Option<PropertyValue>> {
        Ok(or_default(self.lookup(name).await?, default))
    }

    async fn get_object(
        &self,
        name: &str,
        default: Option<Value>,
        reviver: Option<Reviver>,
    ) -> Result<Option<Value>> {
        match self.lookup(name).await? {
            Some(raw) => raw.to_object(name, reviver.as_ref()).map(Some),
            None => Ok(default),
        }
    }

    async fn get_timestamp(
        &self,
        name: &str,
        default: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>> {
        match self.lookup(name).await? {
            Some(raw) => raw.to_timestamp(name),
            None => Ok(default.unwrap_or_else(Utc::now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::EnvVarSource;
    use crate::domain::ConfigError;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn properties(pairs: &[(&str, &str)]) -> Properties {
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Properties::new(EnvVarSource::with_values(values))
    }

    #[tokio::test]
    async fn test_get_property_with_default() {
        let p = properties(&[("present", "v")]);
        assert_eq!(
            p.get_property("present", Some("d")).await.unwrap(),
            Some(PropertyValue::from("v"))
        );
        assert_eq!(
            p.get_property("absent", Some("d")).await.unwrap(),
            Some(PropertyValue::from("d"))
        );
        assert!(p.get_property("absent", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_added_source_is_consulted_last() {
        let mut p = properties(&[("shared", "first")]);
        let fallback = HashMap::from([
            ("shared".to_string(), "second".to_string()),
            ("extra".to_string(), "x".to_string()),
        ]);
        p.add_source(Box::new(EnvVarSource::with_values(fallback)));

        assert_eq!(
            p.get_property("shared", None).await.unwrap(),
            Some(PropertyValue::from("first"))
        );
        assert_eq!(
            p.get_property("extra", None).await.unwrap(),
            Some(PropertyValue::from("x"))
        );
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let p = properties(&[]);
        assert!(matches!(
            p.get_property("", None).await,
            Err(ConfigError::InvalidPropertyName { .. })
        ));
        assert!(p.get_object("", None, None).await.is_err());
        assert!(p.get_timestamp("", None).await.is_err());
    }

    #[tokio::test]
    async fn test_get_object_with_reviver() {
        let p = properties(&[("limits", r#"{"max": 10}"#)]);
        let double: Reviver = Arc::new(|_: &str, v: Value| match v.as_i64() {
            Some(n) => Value::from(n * 2),
            None => v,
        });
        let value = p.get_object("limits", None, Some(double)).await.unwrap();
        assert_eq!(value.unwrap()["max"], 20);
    }

    #[tokio::test]
    async fn test_get_object_default_and_error() {
        let p = properties(&[("broken", "{oops")]);
        let fallback = serde_json::json!({"on": false});
        assert_eq!(
            p.get_object("absent", Some(fallback.clone()), None)
                .await
                .unwrap(),
            Some(fallback)
        );
        assert!(matches!(
            p.get_object("broken", None, None).await,
            Err(ConfigError::TypeConversionError { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_timestamp() {
        let p = properties(&[("launch", "2024-03-01T12:00:00Z")]);
        assert_eq!(
            p.get_timestamp("launch", None).await.unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );

        let fallback = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            p.get_timestamp("absent", Some(fallback)).await.unwrap(),
            fallback
        );

        let before = Utc::now();
        assert!(p.get_timestamp("absent", None).await.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_resolve_request() {
        let p = properties(&[]);
        let request = crate::domain::PropertyRequest::new("region")
            .unwrap()
            .with_default("eu-west");
        assert_eq!(
            p.resolve(&request).await.unwrap(),
            Some(PropertyValue::from("eu-west"))
        );
    }
}
