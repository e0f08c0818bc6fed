// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the resolvers and their composition root.
//!
//! A [`SourceChain`] walks sources in order; [`Properties`] exposes it through
//! the [`PropertyResolver`](crate::domain::PropertyResolver) contract;
//! [`CachedProperties`] and [`NamespacedProperties`] decorate any resolver; and
//! [`PropertyManager`] wires all of them together from settings.

pub mod cached;
pub mod chain;
pub mod context;
pub mod manager;
pub mod namespaced;
pub mod properties;

// Re-export commonly used types
pub use cached::CachedProperties;
pub use chain::SourceChain;
pub use context::RuntimeContext;
pub use manager::{PropertyManager, PropertyManagerBuilder};
pub use namespaced::NamespacedProperties;
pub use properties::Properties;
