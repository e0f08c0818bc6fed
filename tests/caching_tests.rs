// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the caching layer.
//!
//! These tests drive `CachedProperties` over a real `Properties` chain and
//! count how often the underlying source is consulted.


use chaincfg::prelude::*;
use chrono::{TimeZone, Utc};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{MockSource, StalledSource};
use tokio_test::{assert_pending, task};

const MAX_AGE: Duration = Duration::from_secs(30);

fn cached_over(source: &MockSource) -> CachedProperties {
    CachedProperties::new(Arc::new(Properties::new(source.clone())), MAX_AGE)
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_origin_call() {
    let source = MockSource::new("origin").with_value("db-host", "db.internal");
    let cache = cached_over(&source);

    let results = join_all((0..8).map(|_| cache.get_property("db-host", None))).await;

    assert_eq!(source.calls(), 1);
    for result in results {
        assert_eq!(result.unwrap().unwrap().as_str(), "db.internal");
    }
    assert_eq!(cache.in_flight_count(), 0);
}

#[tokio::test]
async fn test_concurrent_failures_share_one_error() {
    test_helpers::init_tracing();
    let source = MockSource::new("origin").with_value("db-host", "db.internal");
    source.fail_with("connection refused");
    let cache = cached_over(&source);

    let results = join_all((0..5).map(|_| cache.get_property("db-host", None))).await;

    assert_eq!(source.calls(), 1);
    let messages: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap_err().to_string())
        .collect();
    assert!(messages.iter().all(|m| m == &messages[0]));
    assert!(messages[0].contains("connection refused"));

    // The failed lookup is gone; the next one reaches the origin again.
    source.recover();
    assert_eq!(
        cache.get_property("db-host", None).await.unwrap().unwrap().as_str(),
        "db.internal"
    );
    assert_eq!(source.calls(), 2);
    assert_eq!(cache.in_flight_count(), 0);
}

#[tokio::test]
async fn test_distinct_names_are_not_coalesced() {
    let source = MockSource::new("origin")
        .with_value("a", "1")
        .with_value("b", "2");
    let cache = cached_over(&source);

    let (a, b) = tokio::join!(cache.get_property("a", None), cache.get_property("b", None));

    assert_eq!(a.unwrap().unwrap().as_str(), "1");
    assert_eq!(b.unwrap().unwrap().as_str(), "2");
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_coalesced_callers_keep_their_own_defaults() {
    let source = MockSource::new("origin");
    let cache = cached_over(&source);

    let (none, first, second) = tokio::join!(
        cache.get_property("missing", None),
        cache.get_property("missing", Some("first")),
        cache.get_property("missing", Some("second")),
    );

    assert_eq!(source.calls(), 1);
    assert!(none.unwrap().is_none());
    assert_eq!(first.unwrap().unwrap().as_str(), "first");
    assert_eq!(second.unwrap().unwrap().as_str(), "second");
    assert!(cache.cache_entry("missing").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_values_expire_after_max_age() {
    let source = MockSource::new("origin").with_value("color", "red");
    let cache = cached_over(&source);

    cache.get_property("color", None).await.unwrap();
    source.set("color", "blue");

    tokio::time::advance(MAX_AGE - Duration::from_secs(1)).await;
    assert_eq!(
        cache.get_property("color", None).await.unwrap().unwrap().as_str(),
        "red"
    );
    assert_eq!(source.calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(
        cache.get_property("color", None).await.unwrap().unwrap().as_str(),
        "blue"
    );
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_override_max_age_applies_per_property() {
    let source = MockSource::new("origin")
        .with_value("short", "s1")
        .with_value("long", "l1");
    let cache = cached_over(&source);
    cache
        .set_cache("short", true, Some(Duration::from_secs(5)))
        .unwrap();

    cache.get_property("short", None).await.unwrap();
    cache.get_property("long", None).await.unwrap();
    source.set("short", "s2");
    source.set("long", "l2");

    tokio::time::advance(Duration::from_secs(6)).await;
    assert_eq!(
        cache.get_property("short", None).await.unwrap().unwrap().as_str(),
        "s2"
    );
    assert_eq!(
        cache.get_property("long", None).await.unwrap().unwrap().as_str(),
        "l1"
    );
}

#[tokio::test]
async fn test_disabled_property_always_reaches_origin() {
    let source = MockSource::new("origin").with_value("volatile", "1");
    let cache = cached_over(&source);
    cache.set_cache("volatile", false, None).unwrap();

    for expected in ["1", "2", "3"] {
        source.set("volatile", expected);
        let value = cache.get_property("volatile", None).await.unwrap().unwrap();
        assert_eq!(value.as_str(), expected);
    }
    assert_eq!(source.calls(), 3);

    let entry = cache.cache_entry("volatile").unwrap();
    assert!(!entry.is_enabled());
    assert!(entry.value().is_none());

    // Coalescing still applies while caching is off.
    join_all((0..4).map(|_| cache.get_property("volatile", None))).await;
    assert_eq!(source.calls(), 4);
}

#[tokio::test]
async fn test_objects_are_decoded_once() {
    let source = MockSource::new("origin").with_value("limits", r#"{"rps": 10}"#);
    let cache = cached_over(&source);

    for _ in 0..3 {
        let limits = cache.get_object("limits", None, None).await.unwrap().unwrap();
        assert_eq!(limits, json!({"rps": 10}));
    }

    assert_eq!(source.calls(), 1);
    let entry = cache.cache_entry("limits").unwrap();
    assert!(!entry.is_raw());

    // The raw accessor still answers with the string form.
    let raw = cache.get_property("limits", None).await.unwrap().unwrap();
    assert_eq!(raw.as_str(), r#"{"rps": 10}"#);
}

#[tokio::test(start_paused = true)]
async fn test_decoded_value_follows_raw_changes() {
    let source = MockSource::new("origin").with_value("launch", "2024-01-01T00:00:00Z");
    let cache = cached_over(&source);

    let first = cache.get_timestamp("launch", None).await.unwrap();
    assert_eq!(first, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

    source.set("launch", "2025-06-01");
    tokio::time::advance(MAX_AGE + Duration::from_secs(1)).await;

    let second = cache.get_timestamp("launch", None).await.unwrap();
    assert_eq!(second, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_updated_value_is_decoded_afresh() {
    let source = MockSource::new("origin").with_value("limits", r#"{"rps": 10}"#);
    let cache = cached_over(&source);

    cache.get_object("limits", None, None).await.unwrap();
    assert!(cache.update_cached("limits", r#"{"rps": 20}"#));

    let limits = cache.get_object("limits", None, None).await.unwrap().unwrap();
    assert_eq!(limits["rps"], 20);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_typed_lookups_coalesce_with_raw_lookups() {
    let source = MockSource::new("origin").with_value("limits", r#"{"rps": 10}"#);
    let cache = cached_over(&source);

    let (raw, object, again) = tokio::join!(
        cache.get_property("limits", None),
        cache.get_object("limits", None, None),
        cache.get_object("limits", Some(json!({})), None),
    );

    assert_eq!(source.calls(), 1);
    assert_eq!(raw.unwrap().unwrap().as_str(), r#"{"rps": 10}"#);
    assert_eq!(object.unwrap(), Some(json!({"rps": 10})));
    assert_eq!(again.unwrap(), Some(json!({"rps": 10})));
}

#[tokio::test]
async fn test_decode_errors_reach_every_caller() {
    let source = MockSource::new("origin").with_value("broken", "{oops");
    let cache = cached_over(&source);

    let results = join_all((0..3).map(|_| cache.get_object("broken", None, None))).await;

    assert!(results.iter().all(|r| r.is_err()));
    assert_eq!(source.calls(), 1);
    assert_eq!(cache.in_flight_count(), 0);
}

#[tokio::test]
async fn test_empty_names_never_reach_origin() {
    let source = MockSource::new("origin");
    let cache = cached_over(&source);

    assert!(cache.get_property("", Some("x")).await.is_err());
    assert!(cache.get_object("", None, None).await.is_err());
    assert!(cache.get_timestamp("", None).await.is_err());
    assert!(cache.set_cache("", true, None).is_err());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_stalled_origin_leaves_callers_pending() {
    let source = StalledSource::default();
    let cache = CachedProperties::new(Arc::new(Properties::new(source.clone())), MAX_AGE);

    let mut first = task::spawn(cache.get_property("slow", None));
    let mut second = task::spawn(cache.get_property("slow", Some("default")));
    let mut object = task::spawn(cache.get_object("slow", None, None));

    assert_pending!(first.poll());
    assert_pending!(second.poll());
    assert_pending!(object.poll());

    assert_eq!(source.calls(), 1);
    // One raw lookup plus one object lookup joined onto it.
    assert_eq!(cache.in_flight_count(), 2);

    assert_pending!(first.poll());
    assert_eq!(source.calls(), 1);
}
