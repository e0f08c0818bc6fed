// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property resolver trait definition.
//!
//! `PropertyResolver` is the narrow contract every consumer of configuration
//! depends on. The plain facade over a source chain, the namespaced view and the
//! caching layer all implement it, so they can be stacked freely.

use crate::domain::{PropertyRequest, PropertyValue, Result, Reviver};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Resolves named properties to values.
///
/// Every accessor rejects an empty `name` with
/// [`ConfigError::InvalidPropertyName`](crate::domain::ConfigError::InvalidPropertyName)
/// before consulting any origin.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use chaincfg::domain::{ConfigError, PropertyResolver, PropertyValue, Result, Reviver};
/// use chrono::{DateTime, Utc};
/// use serde_json::Value;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl PropertyResolver for Fixed {
///     async fn get_property(&self, name: &str, default: Option<&str>) -> Result<Option<PropertyValue>> {
///         if name.is_empty() {
///             return Err(ConfigError::empty_name());
///         }
///         Ok(Some(PropertyValue::from("fixed")))
///     }
///
///     async fn get_object(&self, name: &str, default: Option<Value>, reviver: Option<Reviver>) -> Result<Option<Value>> {
///         Ok(default)
///     }
///
///     async fn get_timestamp(&self, name: &str, default: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
///         Ok(default.unwrap_or_else(Utc::now))
///     }
/// }
/// ```
#[async_trait]
pub trait PropertyResolver: Send + Sync {
    /// Resolves `name` to its raw value.
    ///
    /// Returns `Ok(None)` only when no source has the property and no
    /// `default` was given.
    async fn get_property(&self, name: &str, default: Option<&str>)
        -> Result<Option<PropertyValue>>;

    /// Resolves `name` and decodes it as JSON, applying `reviver` if given.
    ///
    /// Returns `default` when no source has the property.
    async fn get_object(
        &self,
        name: &str,
        default: Option<Value>,
        reviver: Option<Reviver>,
    ) -> Result<Option<Value>>;

    /// Resolves `name` and decodes it as a timestamp.
    ///
    /// Returns `default` (or the current time when `default` is `None`) when no
    /// source has the property.
    async fn get_timestamp(
        &self,
        name: &str,
        default: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>>;

    /// Resolves a prepared [`PropertyRequest`] as a raw value.
    async fn resolve(&self, request: &PropertyRequest) -> Result<Option<PropertyValue>> {
        self.get_property(request.name().as_str(), request.default_value())
            .await
    }

    /// Resolves a prepared [`PropertyRequest`] as a decoded object.
    async fn resolve_object(&self, request: &PropertyRequest) -> Result<Option<Value>> {
        let default = match request.default_value() {
            Some(raw) => Some(PropertyValue::from(raw).to_object(request.name().as_str(), None)?),
            None => None,
        };
        self.get_object(request.name().as_str(), default, request.reviver().cloned())
            .await
    }
}

/// Applies a string default to an optional resolved value.
pub(crate) fn or_default(
    value: Option<PropertyValue>,
    default: Option<&str>,
) -> Option<PropertyValue> {
    value.or_else(|| default.map(PropertyValue::from))
}
