// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property source trait definition.
//!
//! This module defines the `PropertySource` trait, the port every origin of
//! property values implements: the process environment, remote settings stores,
//! or anything an application registers itself. Sources are linked into a
//! [`SourceChain`](crate::service::SourceChain) that tries them in registration
//! order.

use crate::domain::{PropertyName, PropertyValue, Result};
use async_trait::async_trait;

/// A single origin of property values.
///
/// A source only answers for itself; falling back to the next source is the
/// chain's job. Returning `Ok(None)` (or a value that is the empty string) lets
/// the chain move on. Returning `Err` stops the lookup and surfaces the error.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so that resolvers can be shared
/// across tasks.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use chaincfg::domain::{PropertyName, PropertyValue, Result};
/// use chaincfg::ports::PropertySource;
///
/// struct Defaults;
///
/// #[async_trait]
/// impl PropertySource for Defaults {
///     fn name(&self) -> &str {
///         "defaults"
///     }
///
///     async fn resolve_local(&self, name: &PropertyName) -> Result<Option<PropertyValue>> {
///         Ok(match name.as_str() {
///             "log-level" => Some(PropertyValue::from("info")),
///             _ => None,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Returns the name of this source, used in logs and errors.
    fn name(&self) -> &str;

    /// Looks `name` up in this source only.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(PropertyValue))` - This source has the property
    /// * `Ok(None)` - This source does not have the property
    /// * `Err(ConfigError)` - The source failed
    async fn resolve_local(&self, name: &PropertyName) -> Result<Option<PropertyValue>>;
}
