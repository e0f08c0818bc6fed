// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chain of responsibility over property sources.

use crate::domain::{PropertyName, PropertyValue, Result};
use crate::ports::PropertySource;

/// An owned, singly linked chain of property sources.
///
/// Each node holds one source and, optionally, the rest of the chain. Sources
/// are tried in the order they were linked; the first non-empty value wins.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::EnvVarSource;
/// use chaincfg::domain::{PropertyName, PropertyValue};
/// use chaincfg::service::SourceChain;
/// use std::collections::HashMap;
///
/// # #[tokio::main]
/// # async fn main() {
/// let first = EnvVarSource::with_values(HashMap::new());
/// let second = EnvVarSource::with_values(HashMap::from([
///     ("region".to_string(), "eu-west".to_string()),
/// ]));
///
/// let mut chain = SourceChain::new(first);
/// chain.add_link(Box::new(second));
///
/// let name = PropertyName::new("region").unwrap();
/// assert_eq!(chain.resolve(&name).await.unwrap(), Some(PropertyValue::from("eu-west")));
/// assert_eq!(chain.len(), 2);
/// # }
/// ```
pub struct SourceChain {
    source: Box<dyn PropertySource>,
    next: Option<Box<SourceChain>>,
}

impl SourceChain {
    /// Starts a chain with `source` as its head.
    pub fn new(source: impl PropertySource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    /// Starts a chain with an already boxed source.
    pub fn from_boxed(source: Box<dyn PropertySource>) -> Self {
        Self { source, next: None }
    }

    /// Appends `source` at the tail of the chain.
    ///
    /// A node that already has a successor forwards the call, so links are
    /// never replaced.
    pub fn add_link(&mut self, source: Box<dyn PropertySource>) {
        match self.next {
            Some(ref mut next) => next.add_link(source),
            None => self.next = Some(Box::new(SourceChain::from_boxed(source))),
        }
    }

    /// Number of sources in the chain.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a chain has at least its head.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Names of the sources, in lookup order.
    pub fn source_names(&self) -> Vec<&str> {
        self.iter().map(|node| node.source.name()).collect()
    }

    fn iter(&self) -> impl Iterator<Item = &SourceChain> {
        std::iter::successors(Some(self), |node| node.next.as_deref())
    }

    /// Resolves `name` against each source in turn.
    ///
    /// A source answering `None` or an empty value defers to the next one. A
    /// source error stops the walk and is returned.
    pub async fn resolve(&self, name: &PropertyName) -> Result<Option<PropertyValue>> {
        for node in self.iter() {
            match node.source.resolve_local(name).await {
                Ok(Some(value)) if !value.is_empty() => {
                    tracing::trace!(property = %name, source = node.source.name(), "resolved");
                    return Ok(Some(value));
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(
                        property = %name,
                        source = node.source.name(),
                        error = %e,
                        "property source failed"
                    );
                    return Err(e);
                }
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for SourceChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceChain")
            .field("sources", &self.source_names())
            .finish()
    }
}
