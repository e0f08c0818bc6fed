// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential and client construction traits.
//!
//! These ports are used only by the composition root: the manager turns each
//! configured endpoint into a client by asking a [`CredentialProvider`] for the
//! endpoint's identity and handing the credential to a [`ClientFactory`]. The
//! resolver itself never sees credentials.

use crate::domain::{Endpoint, Result};
use crate::ports::remote::{SecretClient, SettingsClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A bearer token issued for an identity.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The token string.
    pub token: String,
    /// When the token stops being valid, if known.
    pub expires_on: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// A handle able to produce tokens for one identity.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// The identity this credential authenticates as.
    fn identity(&self) -> &str;

    /// Obtains a token valid for `scope`.
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// Maps identities to credentials.
pub trait CredentialProvider: Send + Sync {
    /// Returns the credential for `identity`.
    fn get_credential(&self, identity: &str) -> Result<Arc<dyn TokenCredential>>;
}

/// Builds remote clients for configured endpoints.
pub trait ClientFactory: Send + Sync {
    /// Builds a settings store client for `endpoint`.
    fn settings_client(
        &self,
        endpoint: &Endpoint,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Arc<dyn SettingsClient>>;

    /// Builds a secret store client for `endpoint`.
    fn secret_client(
        &self,
        endpoint: &Endpoint,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Arc<dyn SecretClient>>;
}
