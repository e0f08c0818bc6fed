// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caching and request coalescing over any resolver.
//!
//! [`CachedProperties`] keeps one [`CacheEntry`] per property name and one
//! in-flight lookup per `(name, accessor)` pair. While a lookup is outstanding,
//! every other caller asking for the same thing awaits that lookup instead of
//! starting its own, so an origin sees at most one request per key at a time.
//!
//! Registration of an in-flight lookup happens entirely under a lock with no
//! suspension point between the check and the insert. A lookup removes itself
//! from the registry when it completes, whether it succeeded or not.
//!
//! Origin fetches have no timeout: a stalled origin leaves every coalesced
//! caller pending until it answers.

use crate::domain::{
    CacheEntry, ConfigError, DecodedValue, PropertyResolver, PropertyValue, Result, Reviver,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, Span};

type SharedLookup<T> = Shared<BoxFuture<'static, Result<T>>>;

type Registry<T> = HashMap<String, SharedLookup<T>>;

/// Outstanding lookups, one registry per accessor kind.
#[derive(Default)]
struct InFlight {
    raw: Registry<Option<PropertyValue>>,
    objects: Registry<Option<Value>>,
    timestamps: Registry<Option<DateTime<Utc>>>,
}

impl InFlight {
    fn raw(&mut self) -> &mut Registry<Option<PropertyValue>> {
        &mut self.raw
    }

    fn objects(&mut self) -> &mut Registry<Option<Value>> {
        &mut self.objects
    }

    fn timestamps(&mut self) -> &mut Registry<Option<DateTime<Utc>>> {
        &mut self.timestamps
    }

    fn len(&self) -> usize {
        self.raw.len() + self.objects.len() + self.timestamps.len()
    }
}

struct CacheState {
    inner: Arc<dyn PropertyResolver>,
    max_age: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<InFlight>,
    span: Span,
}

impl CacheState {
    /// Joins the outstanding lookup for `name` in `select`'s registry, or
    /// registers the one built by `start`.
    fn coalesce<T, F>(
        self: &Arc<Self>,
        name: &str,
        select: fn(&mut InFlight) -> &mut Registry<T>,
        start: F,
    ) -> SharedLookup<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> BoxFuture<'static, Result<T>>,
    {
        let mut in_flight = self.in_flight.lock();
        let registry = select(&mut in_flight);
        if let Some(existing) = registry.get(name) {
            tracing::trace!(parent: &self.span, property = name, "joining in-flight lookup");
            return existing.clone();
        }

        let state = Arc::clone(self);
        let key = name.to_string();
        let work = start();
        let lookup = async move {
            let result = work.await;
            select(&mut state.in_flight.lock()).remove(&key);
            result
        }
        .instrument(self.span.clone())
        .boxed()
        .shared();

        registry.insert(name.to_string(), lookup.clone());
        lookup
    }

    fn raw_lookup(self: &Arc<Self>, name: &str) -> SharedLookup<Option<PropertyValue>> {
        let state = Arc::clone(self);
        let owned = name.to_string();
        self.coalesce(name, InFlight::raw, move || {
            async move { state.load_raw(&owned).await }.boxed()
        })
    }

    async fn load_raw(&self, name: &str) -> Result<Option<PropertyValue>> {
        let cached = self
            .entries
            .lock()
            .get(name)
            .and_then(|entry| entry.fresh_value().cloned());
        if let Some(value) = cached {
            tracing::debug!(property = name, "cache hit, origin not consulted");
            return Ok(Some(value));
        }

        tracing::debug!(property = name, "cache miss, requesting origin");
        let value = match self.inner.get_property(name, None).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::error!(property = name, error = %e, "origin lookup failed");
                return Err(e);
            }
        };

        match &value {
            Some(value) => self.store(name, value),
            None => tracing::info!(property = name, "no value found for property"),
        }
        Ok(value)
    }

    fn store(&self, name: &str, value: &PropertyValue) {
        let mut entries = self.entries.lock();
        match entries.get_mut(name) {
            Some(entry) if entry.is_enabled() => entry.set_value(value.clone()),
            Some(_) => tracing::debug!(property = name, "caching disabled for property"),
            None => {
                entries.insert(
                    name.to_string(),
                    CacheEntry::with_value(true, self.max_age, value.clone()),
                );
            }
        }
    }

    /// Returns the decoded form `select` picks, if it was cached for exactly `raw`.
    fn cached_decoded<T>(
        &self,
        name: &str,
        raw: &PropertyValue,
        select: impl FnOnce(&CacheEntry) -> Option<T>,
    ) -> Option<T> {
        let entries = self.entries.lock();
        let entry = entries.get(name)?;
        if entry.is_enabled() && entry.value() == Some(raw) {
            select(entry)
        } else {
            None
        }
    }

    fn store_decoded(&self, name: &str, raw: &PropertyValue, decoded: DecodedValue) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(name) {
            if entry.is_enabled() && entry.value() == Some(raw) {
                entry.update_decoded(decoded);
            }
        }
    }

    async fn load_object(
        self: Arc<Self>,
        name: String,
        reviver: Option<Reviver>,
    ) -> Result<Option<Value>> {
        let Some(raw) = self.raw_lookup(&name).await? else {
            return Ok(None);
        };

        if let Some(object) =
            self.cached_decoded(&name, &raw, |entry| entry.decoded_object().cloned())
        {
            tracing::trace!(property = %name, "decoded object served from cache");
            return Ok(Some(object));
        }

        let object = raw.to_object(&name, reviver.as_ref())?;
        self.store_decoded(&name, &raw, DecodedValue::Object(object.clone()));
        Ok(Some(object))
    }

    async fn load_timestamp(self: Arc<Self>, name: String) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.raw_lookup(&name).await? else {
            return Ok(None);
        };

        if let Some(timestamp) =
            self.cached_decoded(&name, &raw, CacheEntry::decoded_timestamp)
        {
            tracing::trace!(property = %name, "decoded timestamp served from cache");
            return Ok(Some(timestamp));
        }

        let timestamp = raw.to_timestamp(&name)?;
        self.store_decoded(&name, &raw, DecodedValue::Timestamp(timestamp));
        Ok(Some(timestamp))
    }
}

/// A resolver that caches values with a time-to-live and coalesces lookups.
///
/// Each property gets an entry the first time a non-empty value is fetched,
/// with caching enabled and the layer's default max-age. Policies can be set
/// ahead of time with [`set_cache`](Self::set_cache), for example to give one
/// property a shorter lifetime or to switch caching off for it.
///
/// Typed accessors share the raw cache: [`get_object`](PropertyResolver::get_object)
/// and [`get_timestamp`](PropertyResolver::get_timestamp) resolve the raw value
/// first, then decode it once and keep the decoded form next to the raw value
/// until the raw value changes. [`get_property`](PropertyResolver::get_property)
/// always returns the raw string.
///
/// A decoded object is cached as produced by the first caller's reviver.
///
/// # Examples
///
/// ```rust
/// use chaincfg::adapters::EnvVarSource;
/// use chaincfg::domain::PropertyResolver;
/// use chaincfg::service::{CachedProperties, Properties};
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let env = EnvVarSource::with_values(HashMap::from([
///     ("feature-flags".to_string(), r#"{"beta": true}"#.to_string()),
/// ]));
/// let cached = CachedProperties::new(Arc::new(Properties::new(env)), Duration::from_secs(300));
/// cached.set_cache("feature-flags", true, Some(Duration::from_secs(30))).unwrap();
///
/// let flags = cached.get_object("feature-flags", None, None).await.unwrap();
/// assert_eq!(flags.unwrap()["beta"], true);
///
/// let entry = cached.cache_entry("feature-flags").unwrap();
/// assert_eq!(entry.max_age(), Duration::from_secs(30));
/// assert!(!entry.is_raw());
/// # }
/// ```
#[derive(Clone)]
pub struct CachedProperties {
    state: Arc<CacheState>,
}

impl CachedProperties {
    /// Wraps `inner`, caching values for `max_age` unless overridden.
    pub fn new(inner: Arc<dyn PropertyResolver>, max_age: Duration) -> Self {
        Self::with_span(inner, max_age, tracing::info_span!("cached_properties"))
    }

    /// Like [`new`](Self::new), recording every lookup in `span`.
    pub fn with_span(inner: Arc<dyn PropertyResolver>, max_age: Duration, span: Span) -> Self {
        Self {
            state: Arc::new(CacheState {
                inner,
                max_age,
                entries: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(InFlight::default()),
                span,
            }),
        }
    }

    /// The default lifetime of a cached value.
    pub fn max_age(&self) -> Duration {
        self.state.max_age
    }

    /// Registers the caching policy for `name`, replacing any existing entry.
    ///
    /// `max_age` falls back to the layer's default when `None`.
    pub fn set_cache(&self, name: &str, enabled: bool, max_age: Option<Duration>) -> Result<()> {
        if name.is_empty() {
            return Err(ConfigError::empty_name());
        }
        let max_age = max_age.unwrap_or(self.state.max_age);
        tracing::debug!(
            parent: &self.state.span,
            property = name,
            enabled,
            ?max_age,
            "cache policy registered"
        );
        self.state
            .entries
            .lock()
            .insert(name.to_string(), CacheEntry::new(enabled, max_age));
        Ok(())
    }

    /// A snapshot of the entry for `name`, if one exists.
    pub fn cache_entry(&self, name: &str) -> Option<CacheEntry> {
        self.state.entries.lock().get(name).cloned()
    }

    /// Replaces the cached value for `name` without moving its expiry.
    ///
    /// Returns `false` if `name` has no entry or caching is disabled for it.
    pub fn update_cached(&self, name: &str, value: impl Into<PropertyValue>) -> bool {
        match self.state.entries.lock().get_mut(name) {
            Some(entry) if entry.is_enabled() => {
                entry.update_value(value.into());
                true
            }
            _ => false,
        }
    }

    /// Number of lookups currently outstanding, across all accessors.
    pub fn in_flight_count(&self) -> usize {
        self.state.in_flight.lock().len()
    }
}

impl std::fmt::Debug for CachedProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedProperties")
            .field("max_age", &self.state.max_age)
            .field("entries", &self.state.entries.lock().len())
            .field("in_flight", &self.in_flight_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PropertyResolver for CachedProperties {
    async fn get_property(
        &self,
        name: &str,
        default: Option<&str>,
    ) -> Result<Option<PropertyValue>> {
        if name.is_empty() {
            return Err(ConfigError::empty_name());
        }
        let value = self.state.raw_lookup(name).await?;
        Ok(value.or_else(|| default.map(PropertyValue::from)))
    }

    async fn get_object(
        &self,
        name: &str,
        default: Option<Value>,
        reviver: Option<Reviver>,
    ) -> Result<Option<Value>> {
        if name.is_empty() {
            return Err(ConfigError::empty_name());
        }
        let state = Arc::clone(&self.state);
        let owned = name.to_string();
        let lookup = self.state.coalesce(name, InFlight::objects, move || {
            state.load_object(owned, reviver).boxed()
        });
        Ok(lookup.await?.or(default))
    }

    async fn get_timestamp(
        &self,
        name: &str,
        default: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>> {
        if name.is_empty() {
            return Err(ConfigError::empty_name());
        }
        let state = Arc::clone(&self.state);
        let owned = name.to_string();
        let lookup = self
            .state
            .coalesce(name, InFlight::timestamps, move || {
                state.load_timestamp(owned).boxed()
            });
        Ok(lookup
            .await?
            .or(default)
            .unwrap_or_else(Utc::now))
    }
}
