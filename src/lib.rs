// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered property resolution with caching and request coalescing.
//!
//! This crate answers "what is the current value of property X" by walking an
//! ordered chain of sources (the process environment, remote settings stores
//! with secret dereferencing, or sources an application registers itself),
//! optionally caching each value with a time-to-live, and making sure that
//! concurrent lookups of the same property never hit an origin twice.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`PropertyName`, `PropertyValue`, `CacheEntry`,
//!   settings, errors) and the `PropertyResolver` contract
//! - **Ports**: Trait definitions for the outside world (`PropertySource`,
//!   `SettingsClient`, `SecretClient`, `CredentialProvider`, `ClientFactory`,
//!   `SettingsParser`)
//! - **Adapters**: Environment and remote configuration sources, in-memory and
//!   Redis stores, credential providers, settings file parsers
//! - **Service**: The source chain, the resolvers layered over it, and the
//!   `PropertyManager` that wires everything together
//!
//! # Features
//!
//! - **Chained Sources**: The first source with a non-empty value wins
//! - **Remote Configuration**: Several stores queried per lookup, last match wins
//! - **Secret References**: Settings pointing at a secret resolve to the secret
//! - **Caching**: Per-property time-to-live, overrides, decoded-value caching
//! - **Coalescing**: One origin request per key, shared by every waiting caller
//! - **Namespaces**: Scoped views that prefix every lookup
//!
//! # Feature Flags
//!
//! - `yaml`: Enable YAML settings files (default)
//! - `redis`: Enable Redis-backed settings and secret stores
//! - `remote`: Enable all remote backends (redis)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use chaincfg::prelude::*;
//! use std::collections::HashMap;
//!
//! # #[tokio::main]
//! # async fn main() -> chaincfg::domain::Result<()> {
//! let manager = PropertyManager::builder()
//!     .with_environment("development")
//!     .with_env_source(EnvVarSource::with_values(HashMap::from([
//!         ("db-host".to_string(), "localhost".to_string()),
//!         ("db-port".to_string(), "5432".to_string()),
//!     ])))
//!     .build()?;
//!
//! let db = manager.namespace("db");
//! let port = db.get_property("port", None).await?.unwrap().as_u64("db-port")?;
//! assert_eq!(port, 5432);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfigError, PropertyManagerSettings, PropertyName, PropertyRequest, PropertyResolver,
        PropertyValue, Result, Reviver,
    };
    pub use crate::ports::{PropertySource, SecretClient, SettingsClient};

    pub use crate::adapters::{EnvVarSource, MatchPolicy, RemoteConfigSource};
    pub use crate::service::{
        CachedProperties, NamespacedProperties, Properties, PropertyManager, RuntimeContext,
    };
}
