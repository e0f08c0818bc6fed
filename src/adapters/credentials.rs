// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential provider adapters.

use crate::domain::{ConfigError, Result};
use crate::ports::{AccessToken, CredentialProvider, TokenCredential};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A credential that always hands out the same token.
#[derive(Clone)]
pub struct StaticTokenCredential {
    identity: String,
    token: String,
}

impl StaticTokenCredential {
    /// Creates a credential for `identity` issuing `token`.
    pub fn new(identity: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenCredential")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: None,
        })
    }
}

type CredentialFactory = dyn Fn(&str) -> Result<Arc<dyn TokenCredential>> + Send + Sync;

/// Creates one credential per identity and hands out the same one thereafter.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::{CachingCredentialProvider, StaticTokenCredential};
/// use chaincfg::ports::{CredentialProvider, TokenCredential};
/// use std::sync::Arc;
///
/// let provider = CachingCredentialProvider::new(|identity: &str| {
///     Ok(Arc::new(StaticTokenCredential::new(identity, "token")) as Arc<dyn TokenCredential>)
/// });
///
/// let first = provider.get_credential("reader").unwrap();
/// let second = provider.get_credential("reader").unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct CachingCredentialProvider {
    factory: Box<CredentialFactory>,
    credentials: Mutex<HashMap<String, Arc<dyn TokenCredential>>>,
}

impl CachingCredentialProvider {
    /// Creates a provider that builds missing credentials with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&str) -> Result<Arc<dyn TokenCredential>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            credentials: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a provider that looks tokens up in a fixed identity-to-token map.
    ///
    /// Unknown identities are rejected.
    pub fn with_tokens(tokens: HashMap<String, String>) -> Self {
        Self::new(move |identity: &str| {
            let token = tokens
                .get(identity)
                .ok_or_else(|| ConfigError::InvalidConfiguration {
                    message: format!("no credential configured for identity '{}'", identity),
                })?;
            Ok(Arc::new(StaticTokenCredential::new(identity, token.clone()))
                as Arc<dyn TokenCredential>)
        })
    }

    /// Number of credentials created so far.
    pub fn len(&self) -> usize {
        self.credentials.lock().len()
    }

    /// True if no credential has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CachingCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingCredentialProvider")
            .field("identities", &self.credentials.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialProvider for CachingCredentialProvider {
    fn get_credential(&self, identity: &str) -> Result<Arc<dyn TokenCredential>> {
        let mut credentials = self.credentials.lock();
        if let Some(existing) = credentials.get(identity) {
            return Ok(Arc::clone(existing));
        }

        let credential = (self.factory)(identity)?;
        tracing::debug!(identity, "credential created");
        credentials.insert(identity.to_string(), Arc::clone(&credential));
        Ok(credential)
    }
}
