// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property manager settings document.
//!
//! These types mirror the settings document consumed by
//! [`PropertyManager`](crate::service::PropertyManager):
//!
//! ```yaml
//! cacheControls:
//!   cache: true
//!   maxAge: 5m
//!   overrides:
//!     - name: feature-flags
//!       cache: true
//!       maxAge: 30s
//! remoteConfig:
//!   enabled: true
//!   endpoints:
//!     - url: redis://config-a:6379
//!       identity: reader
//!   secretVault:
//!     followReferences: true
//!     endpoint:
//!       url: redis://vault:6379
//!       identity: vault-reader
//! ```
//!
//! Durations are written as `<n><unit>` segments (`ms`, `s`, `m`, `h`, `d`), which
//! may be combined (`1h30m`), or as a bare integer number of seconds.

use crate::domain::errors::{ConfigError, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Max-age applied when the settings do not name one.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Top-level settings for the property manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyManagerSettings {
    /// Caching policy; caching is off when absent.
    #[serde(default)]
    pub cache_controls: Option<CacheControls>,
    /// Remote configuration; only the environment is consulted when absent.
    #[serde(default)]
    pub remote_config: Option<RemoteConfigSettings>,
}

/// Caching policy for the whole resolver plus per-property overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheControls {
    /// Whether the caching layer is installed at all.
    #[serde(default)]
    pub cache: bool,
    /// Default lifetime of a cached value.
    #[serde(default = "default_max_age", deserialize_with = "deserialize_duration")]
    pub max_age: Duration,
    /// Policies registered for individual properties before first use.
    #[serde(default)]
    pub overrides: Vec<CacheOverride>,
}

impl Default for CacheControls {
    fn default() -> Self {
        Self {
            cache: false,
            max_age: DEFAULT_MAX_AGE,
            overrides: Vec::new(),
        }
    }
}

/// A caching policy for one named property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheOverride {
    /// The property the policy applies to.
    pub name: String,
    /// Whether the property may be cached.
    #[serde(default = "default_true")]
    pub cache: bool,
    /// Lifetime for this property; the layer default when absent.
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub max_age: Option<Duration>,
}

/// Remote configuration endpoints and secret dereferencing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfigSettings {
    /// Whether the remote source is added to the chain.
    #[serde(default)]
    pub enabled: bool,
    /// Remote settings stores, queried in order.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Secret store used to follow secret references.
    #[serde(default)]
    pub secret_vault: Option<SecretVaultSettings>,
}

/// Secret reference handling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVaultSettings {
    /// Whether secret references are followed.
    #[serde(default)]
    pub follow_references: bool,
    /// The secret store endpoint.
    #[serde(default)]
    pub endpoint: Option<Endpoint>,
}

/// A remote service address plus the identity used to authenticate to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Service URL.
    pub url: String,
    /// Identity handed to the credential provider.
    #[serde(default)]
    pub identity: String,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(url: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            identity: identity.into(),
        }
    }
}

fn default_max_age() -> Duration {
    DEFAULT_MAX_AGE
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

impl RawDuration {
    fn into_duration(self) -> Result<Duration> {
        match self {
            RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
            RawDuration::Text(text) => parse_duration(&text),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    RawDuration::deserialize(deserializer)?
        .into_duration()
        .map_err(serde::de::Error::custom)
}

fn deserialize_optional_duration<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDuration>::deserialize(deserializer)? {
        Some(raw) => raw
            .into_duration()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Parses a duration string such as `5m`, `250ms`, `1h30m` or `90`.
///
/// # Examples
///
/// ```
/// use chaincfg::domain::settings::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration> {
    let text = input.trim();
    let invalid = |reason: &str| ConfigError::ParseError {
        message: format!("invalid duration '{}': {}", input, reason),
        source: None,
    };

    if text.is_empty() {
        return Err(invalid("empty"));
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| invalid("out of range"));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Err(invalid("expected a number"));
        }
        let amount: u64 = rest[..digits]
            .parse()
            .map_err(|_| invalid("out of range"))?;
        rest = &rest[digits..];

        let unit_len = rest.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
        let segment = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(amount)),
            "s" => Some(Duration::from_secs(amount)),
            "m" => amount.checked_mul(60).map(Duration::from_secs),
            "h" => amount.checked_mul(60 * 60).map(Duration::from_secs),
            "d" => amount.checked_mul(24 * 60 * 60).map(Duration::from_secs),
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        }
        .ok_or_else(|| invalid("out of range"))?;
        rest = &rest[unit_len..];

        total = total
            .checked_add(segment)
            .ok_or_else(|| invalid("out of range"))?;
    }

    Ok(total)
}
