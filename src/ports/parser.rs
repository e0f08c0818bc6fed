// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings parser trait definition.
//!
//! This module defines the `SettingsParser` trait, which turns the text of a
//! settings file (JSON, YAML, ...) into [`PropertyManagerSettings`].

use crate::domain::{PropertyManagerSettings, Result};
use std::path::Path;

/// A parser for one settings file format.
///
/// # Examples
///
/// ```rust
/// use chaincfg::domain::{PropertyManagerSettings, Result};
/// use chaincfg::ports::SettingsParser;
///
/// struct EmptyParser;
///
/// impl SettingsParser for EmptyParser {
///     fn parse(&self, _content: &str) -> Result<PropertyManagerSettings> {
///         Ok(PropertyManagerSettings::default())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["empty"]
///     }
/// }
///
/// assert!(EmptyParser.supports(std::path::Path::new("settings.EMPTY")));
/// ```
pub trait SettingsParser: Send + Sync {
    /// Parses settings from the raw file content.
    fn parse(&self, content: &str) -> Result<PropertyManagerSettings>;

    /// Returns the file extensions handled by this parser, without the dot.
    fn supported_extensions(&self) -> &[&str];

    /// True if `path` has one of the supported extensions (case-insensitive).
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.supported_extensions()
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(ext))
            })
    }
}
