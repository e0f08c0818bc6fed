// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache entry model for the caching layer.
//!
//! A `CacheEntry` carries its own caching policy (enabled flag and max-age) so
//! that individual properties can be given a different lifetime, or have caching
//! switched off, before they are ever fetched.

use crate::domain::property_value::PropertyValue;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Expiry horizon for max-ages too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A decoded form of a cached raw value.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedValue {
    /// The raw value decoded as JSON.
    Object(serde_json::Value),
    /// The raw value decoded as a timestamp.
    Timestamp(DateTime<Utc>),
}

/// One property's slot in the cache.
///
/// Lifecycle:
/// - created by [`CacheEntry::new`] as an override (policy known, no value), or
///   by [`CacheEntry::with_value`] on the first successful fetch;
/// - [`CacheEntry::set_value`] stores a fresh value and pushes the expiry out by
///   `max_age`;
/// - [`CacheEntry::update_decoded`] stores a decoded form without touching the
///   expiry. Objects and timestamps have separate slots, so alternating
///   accessors on one name do not evict each other.
///
/// Every mutation is a no-op when caching is disabled for the entry.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    enabled: bool,
    max_age: Duration,
    value: Option<PropertyValue>,
    object: Option<serde_json::Value>,
    timestamp: Option<DateTime<Utc>>,
    expires: Option<Instant>,
}

impl CacheEntry {
    /// Creates an entry with a policy but no value.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaincfg::domain::CacheEntry;
    /// use std::time::Duration;
    ///
    /// let entry = CacheEntry::new(false, Duration::from_secs(30));
    /// assert!(!entry.is_enabled());
    /// assert!(entry.value().is_none());
    /// assert!(entry.is_expired());
    /// ```
    pub fn new(enabled: bool, max_age: Duration) -> Self {
        Self {
            enabled,
            max_age,
            value: None,
            object: None,
            timestamp: None,
            expires: None,
        }
    }

    /// Creates an entry already holding `value`, expiring after `max_age`.
    pub fn with_value(enabled: bool, max_age: Duration, value: PropertyValue) -> Self {
        let mut entry = Self::new(enabled, max_age);
        entry.set_value(value);
        entry
    }

    /// Stores a freshly fetched value and advances the expiry.
    ///
    /// Any decoded forms are dropped; the new value starts out raw. A max-age
    /// that overflows the clock is capped at thirty years.
    pub fn set_value(&mut self, value: PropertyValue) {
        if self.enabled {
            let now = Instant::now();
            self.value = Some(value);
            self.clear_decoded();
            self.expires = now
                .checked_add(self.max_age)
                .or_else(|| now.checked_add(FAR_FUTURE));
        }
    }

    /// Replaces the raw value without advancing the expiry.
    pub fn update_value(&mut self, value: PropertyValue) {
        if self.enabled {
            self.value = Some(value);
            self.clear_decoded();
        }
    }

    /// Stores a decoded form of the current value without advancing the expiry.
    pub fn update_decoded(&mut self, decoded: DecodedValue) {
        if self.enabled && self.value.is_some() {
            match decoded {
                DecodedValue::Object(object) => self.object = Some(object),
                DecodedValue::Timestamp(timestamp) => self.timestamp = Some(timestamp),
            }
        }
    }

    fn clear_decoded(&mut self) {
        self.object = None;
        self.timestamp = None;
    }

    /// Whether caching is enabled for this property.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// How long a fetched value stays valid.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// The cached raw value, if any.
    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// The cached value decoded as JSON, if any.
    pub fn decoded_object(&self) -> Option<&serde_json::Value> {
        self.object.as_ref()
    }

    /// The cached value decoded as a timestamp, if any.
    pub fn decoded_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// True while the value has not been decoded in any form.
    pub fn is_raw(&self) -> bool {
        self.object.is_none() && self.timestamp.is_none()
    }

    /// The instant after which the value is stale.
    pub fn expires(&self) -> Option<Instant> {
        self.expires
    }

    /// True if there is no expiry yet or it has been reached.
    pub fn is_expired(&self) -> bool {
        match self.expires {
            Some(expires) => Instant::now() >= expires,
            None => true,
        }
    }

    /// Returns the value if the entry is enabled and still fresh.
    pub fn fresh_value(&self) -> Option<&PropertyValue> {
        if self.enabled && !self.is_expired() {
            self.value.as_ref()
        } else {
            None
        }
    }
}
