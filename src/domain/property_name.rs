// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property name newtype for validated name handling.
//!
//! This module provides the `PropertyName` type, a newtype wrapper around `String`
//! that can only be constructed from a non-empty name. Every accessor validates its
//! input by building a `PropertyName` before any origin is consulted.

use crate::domain::errors::{ConfigError, Result};
use std::fmt;

/// A validated, non-empty property name.
///
/// # Examples
///
/// ```
/// use chaincfg::domain::PropertyName;
///
/// let name = PropertyName::new("database-host").unwrap();
/// assert_eq!(name.as_str(), "database-host");
///
/// assert!(PropertyName::new("").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyName(String);

impl PropertyName {
    /// Creates a new `PropertyName`, rejecting empty names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPropertyName`] when `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::empty_name());
        }
        Ok(PropertyName(name))
    }

    /// Builds the scoped name `{namespace}{delimiter}{local}`.
    ///
    /// The local part is validated on its own so that an empty local name is
    /// rejected even though the scoped name would not be empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::domain::PropertyName;
    ///
    /// let name = PropertyName::scoped("jwt", "-", "issuer").unwrap();
    /// assert_eq!(name.as_str(), "jwt-issuer");
    ///
    /// assert!(PropertyName::scoped("jwt", "-", "").is_err());
    /// ```
    pub fn scoped(namespace: &str, delimiter: &str, local: &str) -> Result<Self> {
        let local = PropertyName::new(local)?;
        Ok(PropertyName(format!("{}{}{}", namespace, delimiter, local.0)))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the `PropertyName` into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for PropertyName {
    type Error = ConfigError;

    fn try_from(name: &str) -> Result<Self> {
        PropertyName::new(name)
    }
}

impl TryFrom<String> for PropertyName {
    type Error = ConfigError;

    fn try_from(name: String) -> Result<Self> {
        PropertyName::new(name)
    }
}

impl From<PropertyName> for String {
    fn from(name: PropertyName) -> Self {
        name.0
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
