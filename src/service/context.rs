// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime context read from prefixed environment variables.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Prefix used for context variables unless told otherwise.
pub const DEFAULT_PREFIX: &str = "api-";

/// Environment assumed when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Environment name meaning "use the process environment only".
pub const LOCAL_ENVIRONMENT: &str = "local";

/// Process-level facts the manager needs before any property is resolved.
///
/// Every value is read from the variable `{prefix}{name}`. Values set with
/// [`with_value`](Self::with_value) take precedence over the process
/// environment.
///
/// # Examples
///
/// ```rust
/// use chaincfg::service::RuntimeContext;
///
/// let context = RuntimeContext::new().with_value("environment", "staging");
/// assert_eq!(context.environment(), "staging");
/// assert!(!context.is_local());
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    prefix: String,
    values: HashMap<String, String>,
}

impl RuntimeContext {
    /// Creates a context reading `api-*` variables.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Creates a context reading `{prefix}*` variables.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: HashMap::new(),
        }
    }

    /// Pins `name` to `value`, shadowing the process environment.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// The variable prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Reads `{prefix}{name}`.
    pub fn get(&self, name: &str) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        env::var(format!("{}{}", self.prefix, name)).ok()
    }

    /// Reads `{prefix}{name}`, falling back to `default`.
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// The deployment environment; also the label used for remote lookups.
    pub fn environment(&self) -> String {
        self.get_or("environment", DEFAULT_ENVIRONMENT)
    }

    /// True when running in the `local` environment.
    pub fn is_local(&self) -> bool {
        self.environment() == LOCAL_ENVIRONMENT
    }

    /// Directory settings files are looked up in, `./` by default.
    pub fn config_path(&self) -> String {
        self.get_or("configPath", "./")
    }

    /// Where the settings file for `component` lives.
    ///
    /// `{prefix}{component}` names the file directly; otherwise it is
    /// `{config_path}{component}.json`.
    pub fn settings_path(&self, component: &str) -> PathBuf {
        match self.get(component) {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(format!("{}{}.json", self.config_path(), component)),
        }
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}
