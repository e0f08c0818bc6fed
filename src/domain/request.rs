// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property lookup requests.

use crate::domain::errors::Result;
use crate::domain::property_name::PropertyName;
use std::fmt;
use std::sync::Arc;

/// A function applied to every node of a decoded JSON value.
///
/// Receives the node's key (object field name, array index, or `""` for the
/// root) and the already-revived node, and returns the replacement node.
pub type Reviver = Arc<dyn Fn(&str, serde_json::Value) -> serde_json::Value + Send + Sync>;

/// A single property lookup: a validated name plus optional default and reviver.
///
/// # Examples
///
/// ```
/// use chaincfg::domain::PropertyRequest;
///
/// let request = PropertyRequest::new("log-level")
///     .unwrap()
///     .with_default("info");
/// assert_eq!(request.name().as_str(), "log-level");
/// assert_eq!(request.default_value(), Some("info"));
/// ```
#[derive(Clone)]
pub struct PropertyRequest {
    name: PropertyName,
    default: Option<String>,
    reviver: Option<Reviver>,
}

impl PropertyRequest {
    /// Creates a request, validating the name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: PropertyName::new(name)?,
            default: None,
            reviver: None,
        })
    }

    /// Sets the value used when no source has the property.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the reviver applied when the value is decoded as an object.
    pub fn with_reviver(mut self, reviver: Reviver) -> Self {
        self.reviver = Some(reviver);
        self
    }

    /// The requested property name.
    pub fn name(&self) -> &PropertyName {
        &self.name
    }

    /// The fallback value, if any.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// The reviver, if any.
    pub fn reviver(&self) -> Option<&Reviver> {
        self.reviver.as_ref()
    }
}

impl fmt::Debug for PropertyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRequest")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("reviver", &self.reviver.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
