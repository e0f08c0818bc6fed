// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property value type with type-safe conversions.
//!
//! Sources always produce strings. `PropertyValue` wraps that string and provides
//! the conversions callers need: scalars, JSON objects (with an optional reviver)
//! and timestamps.

use crate::domain::errors::{ConfigError, Result};
use crate::domain::request::Reviver;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Raised when a value matches none of the accepted timestamp layouts.
#[derive(Debug, Error)]
#[error("unrecognized timestamp format: '{0}'")]
struct TimestampFormatError(String);

/// A raw property value as produced by a source.
///
/// # Examples
///
/// ```
/// use chaincfg::domain::PropertyValue;
///
/// let value = PropertyValue::from("42");
/// assert_eq!(value.as_str(), "42");
/// assert_eq!(value.as_i64("max-connections").unwrap(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyValue(String);

impl PropertyValue {
    /// Creates a new `PropertyValue` from a `String`.
    pub fn new(value: String) -> Self {
        PropertyValue(value)
    }

    /// Wraps a source result, treating an empty string as "no value".
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::domain::PropertyValue;
    ///
    /// assert!(PropertyValue::non_empty(String::new()).is_none());
    /// assert!(PropertyValue::non_empty("x".to_string()).is_some());
    /// ```
    pub fn non_empty(value: String) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(PropertyValue(value))
        }
    }

    /// Returns the value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns an owned copy of the value.
    pub fn as_string(&self) -> String {
        self.0.clone()
    }

    /// Returns true if the value is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes the following values (case-insensitive):
    /// - `true`: "true", "yes", "1", "on"
    /// - `false`: "false", "no", "0", "off"
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        match self.0.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => self
                .0
                .parse::<bool>()
                .map_err(|e| ConfigError::from_parse_bool_error(key.to_string(), e)),
        }
    }

    /// Converts the value to an `i64`.
    pub fn as_i64(&self, key: &str) -> Result<i64> {
        self.0
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to a `u64`.
    pub fn as_u64(&self, key: &str) -> Result<u64> {
        self.0
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to an `f64`.
    pub fn as_f64(&self, key: &str) -> Result<f64> {
        self.0
            .trim()
            .parse::<f64>()
            .map_err(|e| ConfigError::from_parse_float_error(key.to_string(), e))
    }

    /// Parses the value into any type that implements `FromStr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::domain::PropertyValue;
    /// use std::net::IpAddr;
    ///
    /// let value = PropertyValue::from("127.0.0.1");
    /// let ip: IpAddr = value.parse("bind-address").unwrap();
    /// assert_eq!(ip.to_string(), "127.0.0.1");
    /// ```
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.0
            .parse::<T>()
            .map_err(|e| ConfigError::TypeConversionError {
                key: key.to_string(),
                target_type: std::any::type_name::<T>().to_string(),
                source: Arc::new(e),
            })
    }

    /// Decodes the value as JSON, applying `reviver` to every node.
    ///
    /// The reviver runs bottom-up: children before their parent, and the root
    /// last with the key `""`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::domain::PropertyValue;
    ///
    /// let value = PropertyValue::from(r#"{"retries": 3}"#);
    /// let object = value.to_object("client", None).unwrap();
    /// assert_eq!(object["retries"], 3);
    /// ```
    pub fn to_object(&self, key: &str, reviver: Option<&Reviver>) -> Result<Value> {
        let decoded: Value = serde_json::from_str(&self.0)
            .map_err(|e| ConfigError::from_json_error(key.to_string(), e))?;
        Ok(match reviver {
            Some(reviver) => revive("", decoded, reviver),
            None => decoded,
        })
    }

    /// Decodes the value as a point in time.
    ///
    /// Accepted layouts, tried in order: RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC),
    /// `YYYY-MM-DD` (midnight UTC), and integer milliseconds since the epoch.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::domain::PropertyValue;
    ///
    /// let value = PropertyValue::from("2024-03-01T12:00:00Z");
    /// let ts = value.to_timestamp("launch").unwrap();
    /// assert_eq!(ts.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    /// ```
    pub fn to_timestamp(&self, key: &str) -> Result<DateTime<Utc>> {
        let raw = self.0.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Ok(Utc.from_utc_datetime(&naive));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&naive));
            }
        }
        if let Ok(millis) = raw.parse::<i64>() {
            if let Some(ts) = Utc.timestamp_millis_opt(millis).single() {
                return Ok(ts);
            }
        }

        Err(ConfigError::TypeConversionError {
            key: key.to_string(),
            target_type: "timestamp".to_string(),
            source: Arc::new(TimestampFormatError(raw.to_string())),
        })
    }
}

fn revive(key: &str, value: Value, reviver: &Reviver) -> Value {
    let value = match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = revive(&k, v, reviver);
                    (k, v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| revive(&i.to_string(), v, reviver))
                .collect(),
        ),
        other => other,
    };
    reviver(key, value)
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue(s.to_string())
    }
}

impl From<PropertyValue> for String {
    fn from(value: PropertyValue) -> Self {
        value.0
    }
}

impl AsRef<str> for PropertyValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
