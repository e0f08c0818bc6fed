// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing property source and client implementations.
//!
//! This module contains concrete implementations of the traits defined in the
//! ports layer: the environment and remote configuration sources, in-memory and
//! Redis-backed remote stores, credential providers and settings file parsers.

pub mod credentials;
pub mod env_var;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod remote_config;
pub mod settings_file;

// Re-export adapters based on feature flags
pub use credentials::{CachingCredentialProvider, StaticTokenCredential};
pub use env_var::EnvVarSource;
pub use memory::{MemorySecretClient, MemorySettingsClient};
#[cfg(feature = "redis")]
pub use redis::{RedisClientFactory, RedisSecretClient, RedisSettingsClient};
pub use remote_config::{MatchPolicy, RemoteConfigSource};
pub use settings_file::JsonSettingsParser;
#[cfg(feature = "yaml")]
pub use settings_file::YamlSettingsParser;
