// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable property source adapter.
//!
//! This module provides a source that reads property values from the process
//! environment. It is the base of every chain the
//! [`PropertyManager`](crate::service::PropertyManager) builds.

use crate::domain::{PropertyName, PropertyValue, Result};
use crate::ports::PropertySource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::env;

/// Maximum length for environment variable names (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

/// Property source backed by environment variables.
///
/// Lookups are live: every call reads the current process environment, so a
/// variable set after construction is visible on the next lookup. Property
/// names are used verbatim as variable names (after an optional prefix).
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::EnvVarSource;
/// use chaincfg::ports::PropertySource;
///
/// // Read any variable
/// let source = EnvVarSource::new();
/// assert_eq!(source.name(), "env");
///
/// // Read `MYAPP_{name}` for property `{name}`
/// let source = EnvVarSource::with_prefix("MYAPP_");
/// ```
#[derive(Debug, Default)]
pub struct EnvVarSource {
    /// Prepended to every property name to form the variable name
    prefix: Option<String>,
    /// Fixed values used instead of the process environment
    values: Option<HashMap<String, String>>,
}

impl EnvVarSource {
    /// Creates a source that reads the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that reads `{prefix}{name}` for property `name`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            values: None,
        }
    }

    /// Creates a source with pre-populated values.
    ///
    /// **Note**: This method is primarily intended for testing. The process
    /// environment is never consulted by the returned source.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chaincfg::adapters::EnvVarSource;
    /// use std::collections::HashMap;
    ///
    /// let mut values = HashMap::new();
    /// values.insert("db-host".to_string(), "localhost".to_string());
    ///
    /// let source = EnvVarSource::with_values(values);
    /// ```
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            prefix: None,
            values: Some(values),
        }
    }

    fn variable_name(&self, name: &PropertyName) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.as_str().to_string(),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        if let Some(values) = &self.values {
            return values.get(key).cloned();
        }
        if key.len() > MAX_ENV_KEY_LEN {
            tracing::debug!(
                "Skipping oversized environment variable name: key_len={} (max={})",
                key.len(),
                MAX_ENV_KEY_LEN
            );
            return None;
        }

        if key.contains(['=', '\0']) {
            return None;
        }

        let value = env::var_os(key)?.into_string().ok()?;
        if value.len() > MAX_ENV_VALUE_LEN {
            tracing::debug!(
                "Skipping oversized environment variable: key={}, value_len={} (max={})",
                key,
                value.len(),
                MAX_ENV_VALUE_LEN
            );
            return None;
        }
        Some(value)
    }
}

#[async_trait]
impl PropertySource for EnvVarSource {
    fn name(&self) -> &str {
        "env"
    }

    async fn resolve_local(&self, name: &PropertyName) -> Result<Option<PropertyValue>> {
        let key = self.variable_name(name);
        let value = self.read(&key).and_then(PropertyValue::non_empty);
        tracing::trace!(key = %key, found = value.is_some(), "environment lookup");
        Ok(value)
    }
}
