// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings file parsers.
//!
//! This module turns settings documents into [`PropertyManagerSettings`]. JSON
//! is always available; YAML needs the `yaml` feature.

use crate::domain::{ConfigError, PropertyManagerSettings, Result};
use crate::ports::SettingsParser;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Maximum allowed size for settings files (10MB)
const MAX_SETTINGS_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// JSON settings parser.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::JsonSettingsParser;
/// use chaincfg::ports::SettingsParser;
///
/// let settings = JsonSettingsParser
///     .parse(r#"{ "cacheControls": { "cache": true, "maxAge": "1m" } }"#)
///     .unwrap();
/// assert!(settings.cache_controls.unwrap().cache);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSettingsParser;

impl SettingsParser for JsonSettingsParser {
    fn parse(&self, content: &str) -> Result<PropertyManagerSettings> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to parse JSON settings: {}", e),
            source: Some(Arc::new(e)),
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}

/// YAML settings parser.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSettingsParser;

#[cfg(feature = "yaml")]
impl SettingsParser for YamlSettingsParser {
    fn parse(&self, content: &str) -> Result<PropertyManagerSettings> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to parse YAML settings: {}", e),
            source: Some(Arc::new(e)),
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

fn parsers() -> Vec<Box<dyn SettingsParser>> {
    let mut parsers: Vec<Box<dyn SettingsParser>> = vec![Box::new(JsonSettingsParser)];
    #[cfg(feature = "yaml")]
    parsers.push(Box::new(YamlSettingsParser));
    parsers
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
}

impl PropertyManagerSettings {
    /// Parses a JSON settings document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        JsonSettingsParser.parse(content)
    }

    /// Parses a YAML settings document.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        YamlSettingsParser.parse(content)
    }

    /// Loads settings from a file, choosing the parser by file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is larger than 10MB, has an
    /// extension no parser handles, or does not parse.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use chaincfg::domain::PropertyManagerSettings;
    ///
    /// let settings = PropertyManagerSettings::from_file("/etc/myapp/properties.json").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let parser = parsers()
            .into_iter()
            .find(|parser| parser.supports(path))
            .ok_or_else(|| ConfigError::InvalidConfiguration {
                message: format!("Unsupported settings file type: {}", file_name(path)),
            })?;

        let metadata = fs::metadata(path)?;
        if metadata.len() > MAX_SETTINGS_FILE_SIZE {
            return Err(ConfigError::InvalidConfiguration {
                message: format!(
                    "Settings file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_SETTINGS_FILE_SIZE
                ),
            });
        }

        let content = fs::read_to_string(path)?;
        tracing::debug!(file = file_name(path), "loaded settings file");
        parser.parse(&content)
    }
}
