// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the resolver and the outside world: property sources, remote settings
//! and secret stores, credentials, and settings file parsers. These traits are
//! implemented by adapters in the adapters layer.

pub mod credentials;
pub mod parser;
pub mod remote;
pub mod source;

// Re-export commonly used types
pub use credentials::{AccessToken, ClientFactory, CredentialProvider, TokenCredential};
pub use parser::SettingsParser;
pub use remote::{
    RemoteSetting, Secret, SecretClient, SecretReference, SettingsClient,
    SECRET_REFERENCE_CONTENT_TYPE,
};
pub use source::PropertySource;
