// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote settings and secret store client traits.
//!
//! The remote configuration source talks to its backends only through these
//! ports. A settings store answers label-scoped lookups; a secret store resolves
//! secret references found in settings.

use crate::domain::{ConfigError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Content type that marks a setting as a reference to a secret.
pub const SECRET_REFERENCE_CONTENT_TYPE: &str =
    "application/vnd.microsoft.appconfig.keyvaultref+json;charset=utf-8";

/// A setting as returned by a remote settings store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSetting {
    /// The stored value.
    pub value: String,
    /// The stored content type, if any.
    #[serde(default)]
    pub content_type: Option<String>,
}

impl RemoteSetting {
    /// Creates a plain setting without a content type.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            content_type: None,
        }
    }

    /// Creates a setting that references the secret at `uri`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::ports::RemoteSetting;
    ///
    /// let setting = RemoteSetting::reference_to("https://vault/secrets/db-password");
    /// assert!(setting.is_secret_reference());
    /// assert_eq!(
    ///     setting.secret_reference().unwrap().uri,
    ///     "https://vault/secrets/db-password"
    /// );
    /// ```
    pub fn reference_to(uri: impl Into<String>) -> Self {
        let reference = SecretReference { uri: uri.into() };
        Self {
            value: serde_json::json!({ "uri": reference.uri }).to_string(),
            content_type: Some(SECRET_REFERENCE_CONTENT_TYPE.to_string()),
        }
    }

    /// True if the content type marks this setting as a secret reference.
    ///
    /// Only the media type is compared (case-insensitively); parameters such as
    /// `charset` are ignored.
    pub fn is_secret_reference(&self) -> bool {
        fn essence(content_type: &str) -> &str {
            content_type.split(';').next().unwrap_or_default().trim()
        }

        self.content_type.as_deref().is_some_and(|ct| {
            essence(ct).eq_ignore_ascii_case(essence(SECRET_REFERENCE_CONTENT_TYPE))
        })
    }

    /// Decodes the secret reference payload.
    pub fn secret_reference(&self) -> Result<SecretReference> {
        serde_json::from_str(&self.value).map_err(|e| ConfigError::ParseError {
            message: "malformed secret reference".to_string(),
            source: Some(std::sync::Arc::new(e)),
        })
    }
}

/// The payload of a secret reference setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    /// Location of the secret in the secret store.
    pub uri: String,
}

impl SecretReference {
    /// Splits `.../secrets/{name}[/{version}]` into name and optional version.
    ///
    /// Falls back to the whole URI as the name when it has no `secrets` segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::ports::SecretReference;
    ///
    /// let reference = SecretReference { uri: "https://vault.example/secrets/db/v2".to_string() };
    /// assert_eq!(reference.name_and_version(), ("db", Some("v2")));
    /// ```
    pub fn name_and_version(&self) -> (&str, Option<&str>) {
        let path = self.uri.trim_end_matches('/');
        let mut segments = path.split('/');
        while let Some(segment) = segments.next() {
            if segment == "secrets" {
                if let Some(name) = segments.next().filter(|s| !s.is_empty()) {
                    let version = segments.next().filter(|s| !s.is_empty());
                    return (name, version);
                }
            }
        }
        (path, None)
    }
}

/// A secret as returned by a secret store.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    /// The secret's value.
    pub value: String,
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret").field("value", &"<redacted>").finish()
    }
}

/// A remote settings store.
#[async_trait]
pub trait SettingsClient: Send + Sync {
    /// A short identifier for logs (typically the endpoint URL).
    fn endpoint(&self) -> &str;

    /// Fetches the setting stored under `key` for `label`.
    ///
    /// Returns `Ok(None)` if the store has no such setting.
    async fn fetch_setting(&self, key: &str, label: Option<&str>) -> Result<Option<RemoteSetting>>;
}

/// A secret store able to dereference secret references.
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// A short identifier for logs (typically the endpoint URL).
    fn endpoint(&self) -> &str;

    /// Fetches the secret at `uri`.
    async fn fetch_secret(&self, uri: &str) -> Result<Secret>;
}
