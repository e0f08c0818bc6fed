// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing the core property types.
//!
//! This module contains the types shared by every layer: validated names, raw
//! values and their decoded forms, cache entries, lookup requests, the error type
//! and the `PropertyResolver` contract. It has no knowledge of concrete sources.

pub mod cache_entry;
pub mod errors;
pub mod property_name;
pub mod property_value;
pub mod request;
pub mod resolver;
pub mod settings;

// Re-export commonly used types
pub use cache_entry::{CacheEntry, DecodedValue};
pub use errors::{ConfigError, Result, SharedError};
pub use property_name::PropertyName;
pub use property_value::PropertyValue;
pub use request::{PropertyRequest, Reviver};
pub use resolver::PropertyResolver;
pub use settings::{
    CacheControls, CacheOverride, Endpoint, PropertyManagerSettings, RemoteConfigSettings,
    SecretVaultSettings,
};
