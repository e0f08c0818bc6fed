// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for property resolution.
//!
//! This module defines the error types that can occur while resolving, decoding,
//! or caching properties. All errors use `thiserror` for proper error handling
//! and conversion.
//!
//! Errors are `Clone`: a single failed origin fetch is handed unchanged to every
//! caller that was coalesced onto it, so underlying causes are shared behind an
//! [`Arc`] rather than boxed.

use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;
use std::sync::Arc;
use thiserror::Error;

/// A shareable underlying error cause.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// The main error type for property operations.
///
/// This enum is marked as `#[non_exhaustive]` to allow for future additions
/// without breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use chaincfg::domain::errors::ConfigError;
///
/// fn lookup(name: &str) -> Result<String, ConfigError> {
///     if name.is_empty() {
///         return Err(ConfigError::InvalidPropertyName {
///             message: "Parameter 'name' cannot be empty.".to_string(),
///         });
///     }
///     Ok(name.to_string())
/// }
///
/// assert!(lookup("").is_err());
/// ```
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The property name failed validation (for example, it was empty).
    #[error("Invalid property name: {message}")]
    InvalidPropertyName {
        /// Why the name was rejected
        message: String,
    },

    /// Failed to convert a property value to the requested type.
    #[error("Failed to convert property '{key}' to type {target_type}: {source}")]
    TypeConversionError {
        /// The property being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: SharedError,
    },

    /// An error occurred in a property source or a remote client.
    #[error("Property source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<SharedError>,
    },

    /// Failed to parse a settings document or a structured value.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<SharedError>,
    },

    /// The manager settings are inconsistent or incomplete.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// The error message
        message: String,
    },

    /// An I/O error occurred while reading settings.
    #[error("I/O error: {0}")]
    IoError(#[source] Arc<std::io::Error>),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(Arc::new(err))
    }
}

impl ConfigError {
    /// Creates the error raised for an empty property name.
    pub fn empty_name() -> Self {
        ConfigError::InvalidPropertyName {
            message: "Parameter 'name' cannot be empty.".to_string(),
        }
    }

    /// Creates a `SourceError` wrapping an underlying cause.
    pub fn source_error<E>(source_name: impl Into<String>, message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::SourceError {
            source_name: source_name.into(),
            message: message.into(),
            source: Some(Arc::new(err)),
        }
    }

    /// Creates a TypeConversionError from a ParseIntError.
    pub fn from_parse_int_error(key: String, err: ParseIntError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "integer".to_string(),
            source: Arc::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseFloatError.
    pub fn from_parse_float_error(key: String, err: ParseFloatError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "float".to_string(),
            source: Arc::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseBoolError.
    pub fn from_parse_bool_error(key: String, err: ParseBoolError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "boolean".to_string(),
            source: Arc::new(err),
        }
    }

    /// Creates a TypeConversionError from a JSON decoding error.
    pub fn from_json_error(key: String, err: serde_json::Error) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "object".to_string(),
            source: Arc::new(err),
        }
    }
}

/// A specialized Result type for property operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
