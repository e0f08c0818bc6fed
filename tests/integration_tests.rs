// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the property manager.
//!
//! These tests build managers the way an application would: from settings
//! files, with in-memory remote stores standing in for real ones.


use chaincfg::adapters::{
    CachingCredentialProvider, EnvVarSource, MemorySecretClient, MemorySettingsClient,
};
use chaincfg::ports::RemoteSetting;
use chaincfg::prelude::*;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{Builder, TempDir};
use test_helpers::{create_test_source, MemoryClientFactory, MockSource};

fn no_env() -> EnvVarSource {
    EnvVarSource::with_values(HashMap::new())
}

fn write_settings(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const CACHED_JSON: &str = r#"{
    "cacheControls": {
        "cache": true,
        "maxAge": "10m",
        "overrides": [
            { "name": "volatile", "cache": false },
            { "name": "short-lived", "maxAge": "5s" }
        ]
    }
}"#;

#[tokio::test]
async fn test_typed_values_through_manager() {
    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_source(create_test_source())
        .build()
        .unwrap();

    let int = manager.get_property("int-value", None).await.unwrap().unwrap();
    assert_eq!(int.as_i64("int-value").unwrap(), 42);

    let flag = manager.get_property("bool-value", None).await.unwrap().unwrap();
    assert!(flag.as_bool("bool-value").unwrap());

    let float = manager.get_property("float-value", None).await.unwrap().unwrap();
    assert_eq!(float.as_f64("float-value").unwrap(), 2.5);

    let object = manager
        .get_object("object-value", None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(object, json!({"retries": 3, "hosts": ["a", "b"]}));

    let ts = manager.get_timestamp("timestamp-value", None).await.unwrap();
    assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap());
}

#[tokio::test]
async fn test_defaults_for_missing_properties() {
    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .build()
        .unwrap();

    assert!(manager.get_property("missing", None).await.unwrap().is_none());
    assert_eq!(
        manager
            .get_property("missing", Some("fallback"))
            .await
            .unwrap()
            .unwrap()
            .as_str(),
        "fallback"
    );
    assert_eq!(
        manager
            .get_object("missing", Some(json!({"on": true})), None)
            .await
            .unwrap(),
        Some(json!({"on": true}))
    );

    let default_ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(
        manager.get_timestamp("missing", Some(default_ts)).await.unwrap(),
        default_ts
    );
}

#[tokio::test]
async fn test_invalid_values_are_errors() {
    let source = MockSource::new("bad")
        .with_value("broken-object", "{not json")
        .with_value("broken-ts", "yesterday-ish");
    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_source(source)
        .build()
        .unwrap();

    assert!(manager.get_object("broken-object", None, None).await.is_err());
    assert!(manager.get_timestamp("broken-ts", None).await.is_err());
    assert!(manager.get_property("", None).await.is_err());
}

#[tokio::test]
async fn test_requests_and_revivers() {
    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_source(create_test_source())
        .build()
        .unwrap();

    let request = PropertyRequest::new("string-value").unwrap();
    assert_eq!(manager.resolve(&request).await.unwrap().unwrap().as_str(), "test");

    let request = PropertyRequest::new("missing-object")
        .unwrap()
        .with_default(r#"{"enabled": false}"#);
    assert_eq!(
        manager.resolve_object(&request).await.unwrap(),
        Some(json!({"enabled": false}))
    );

    let double: Reviver = Arc::new(|key: &str, value: Value| match (key, value.as_i64()) {
        ("retries", Some(n)) => json!(n * 2),
        (_, _) => value,
    });
    let request = PropertyRequest::new("object-value")
        .unwrap()
        .with_reviver(double);
    let object = manager.resolve_object(&request).await.unwrap().unwrap();
    assert_eq!(object["retries"], 6);
}

#[tokio::test]
async fn test_namespaced_views() {
    let source = MockSource::new("app")
        .with_value("db-host", "db.internal")
        .with_value("db-replica-host", "replica.internal")
        .with_value("cache.ttl", "60");
    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_source(source)
        .build()
        .unwrap();

    let db = manager.namespace("db");
    assert_eq!(db.get_property("host", None).await.unwrap().unwrap().as_str(), "db.internal");

    let replica = NamespacedProperties::new(Arc::new(db), "replica");
    assert_eq!(
        replica.get_property("host", None).await.unwrap().unwrap().as_str(),
        "replica.internal"
    );

    let cache = manager.namespace_with_delimiter("cache", ".");
    assert_eq!(cache.get_property("ttl", None).await.unwrap().unwrap().as_str(), "60");
    assert_eq!(
        cache.get_property("size", Some("128")).await.unwrap().unwrap().as_str(),
        "128"
    );
}

#[tokio::test]
async fn test_settings_file_enables_cache_and_overrides() {
    let file = write_settings(".json", CACHED_JSON);
    let source = MockSource::new("origin")
        .with_value("stable", "one")
        .with_value("volatile", "a");

    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_settings_file(file.path())
        .unwrap()
        .with_source(source.clone())
        .build()
        .unwrap();

    let cache = manager.cache().expect("cache layer installed");
    assert_eq!(cache.max_age(), Duration::from_secs(600));
    assert!(!cache.cache_entry("volatile").unwrap().is_enabled());
    assert_eq!(
        cache.cache_entry("short-lived").unwrap().max_age(),
        Duration::from_secs(5)
    );

    manager.get_property("stable", None).await.unwrap();
    source.set("stable", "two");
    let stable = manager.get_property("stable", None).await.unwrap().unwrap();
    assert_eq!(stable.as_str(), "one");

    manager.get_property("volatile", None).await.unwrap();
    source.set("volatile", "b");
    let volatile = manager.get_property("volatile", None).await.unwrap().unwrap();
    assert_eq!(volatile.as_str(), "b");
}

#[tokio::test]
async fn test_unbounded_max_age_caches_without_overflow() {
    let file = write_settings(
        ".json",
        r#"{ "cacheControls": { "cache": true, "maxAge": "18446744073709551615" } }"#,
    );
    let source = MockSource::new("origin").with_value("k", "v1");

    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_settings_file(file.path())
        .unwrap()
        .with_source(source.clone())
        .build()
        .unwrap();

    let (a, b) = tokio::join!(
        manager.get_property("k", None),
        manager.get_property("k", None)
    );
    assert_eq!(a.unwrap().unwrap().as_str(), "v1");
    assert_eq!(b.unwrap().unwrap().as_str(), "v1");

    source.set("k", "v2");
    let again = manager.get_property("k", None).await.unwrap().unwrap();
    assert_eq!(again.as_str(), "v1");
    assert_eq!(source.calls(), 1);
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn test_yaml_settings_file() {
    let file = write_settings(
        ".yaml",
        "cacheControls:\n  cache: true\n  maxAge: 1h30m\n",
    );

    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_settings_file(file.path())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(
        manager.cache().unwrap().max_age(),
        Duration::from_secs(90 * 60)
    );
}

#[test]
fn test_settings_file_errors() {
    let unsupported = write_settings(".ini", "cache=true");
    assert!(PropertyManager::builder()
        .with_settings_file(unsupported.path())
        .is_err());

    let malformed = write_settings(".json", "{\"cacheControls\": ");
    assert!(PropertyManager::builder()
        .with_settings_file(malformed.path())
        .is_err());

    assert!(PropertyManager::builder()
        .with_settings_file("/nonexistent/PropertyManager.json")
        .is_err());
}

#[test]
fn test_context_settings_location() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("PropertyManager.json"), CACHED_JSON).unwrap();

    let context = RuntimeContext::with_prefix("chaincfg-it-ctx-")
        .with_value("configPath", format!("{}/", dir.path().display()));
    let manager = PropertyManager::builder()
        .with_context(context)
        .with_environment("development")
        .with_env_source(no_env())
        .with_context_settings()
        .unwrap()
        .build()
        .unwrap();
    assert!(manager.cache().is_some());

    let empty = TempDir::new().unwrap();
    let context = RuntimeContext::with_prefix("chaincfg-it-ctx-")
        .with_value("configPath", format!("{}/", empty.path().display()));
    let manager = PropertyManager::builder()
        .with_context(context)
        .with_env_source(no_env())
        .with_context_settings()
        .unwrap()
        .build()
        .unwrap();
    assert!(manager.cache().is_none());
    assert_eq!(manager.context().environment(), "development");
}

#[tokio::test]
async fn test_secret_references_end_to_end() {
    test_helpers::init_tracing();
    let settings = MemorySettingsClient::new("memory://config")
        .with_setting("db-host", Some("production"), RemoteSetting::plain("db.internal"))
        .with_setting(
            "db-password",
            Some("production"),
            RemoteSetting::reference_to("https://vault.example/secrets/db-password"),
        );
    let secrets = Arc::new(
        MemorySecretClient::new("memory://vault")
            .with_secret("https://vault.example/secrets/db-password", "hunter2"),
    );
    let factory = MemoryClientFactory::new()
        .with_settings(Arc::new(settings))
        .with_secrets(Arc::clone(&secrets));

    let json = r#"{
        "cacheControls": { "cache": true, "maxAge": "1m" },
        "remoteConfig": {
            "enabled": true,
            "endpoints": [ { "url": "memory://config", "identity": "reader" } ],
            "secretVault": {
                "followReferences": true,
                "endpoint": { "url": "memory://vault", "identity": "vault-reader" }
            }
        }
    }"#;
    let credentials = Arc::new(CachingCredentialProvider::with_tokens(HashMap::from([
        ("reader".to_string(), "r".to_string()),
        ("vault-reader".to_string(), "v".to_string()),
    ])));

    let manager = PropertyManager::builder()
        .with_environment("production")
        .with_env_source(no_env())
        .with_settings(PropertyManagerSettings::from_json_str(json).unwrap())
        .with_credential_provider(credentials.clone())
        .with_client_factory(Arc::new(factory))
        .build()
        .unwrap();

    assert_eq!(credentials.len(), 2);

    let db = manager.namespace("db");
    assert_eq!(db.get_property("host", None).await.unwrap().unwrap().as_str(), "db.internal");
    assert_eq!(
        db.get_property("password", None).await.unwrap().unwrap().as_str(),
        "hunter2"
    );

    // Served from the cache the second time.
    db.get_property("password", None).await.unwrap();
    assert_eq!(secrets.calls(), 1);
}

#[tokio::test]
async fn test_references_kept_raw_when_not_followed() {
    let reference = RemoteSetting::reference_to("https://vault.example/secrets/api-key");
    let settings = MemorySettingsClient::new("memory://config").with_setting(
        "api-key",
        Some("production"),
        reference.clone(),
    );
    let factory = MemoryClientFactory::new().with_settings(Arc::new(settings));

    let json = r#"{
        "remoteConfig": {
            "enabled": true,
            "endpoints": [ { "url": "memory://config", "identity": "reader" } ],
            "secretVault": { "followReferences": false }
        }
    }"#;

    let manager = PropertyManager::builder()
        .with_environment("production")
        .with_env_source(no_env())
        .with_settings(PropertyManagerSettings::from_json_str(json).unwrap())
        .with_credential_provider(test_helpers::any_identity())
        .with_client_factory(Arc::new(factory))
        .build()
        .unwrap();

    let raw = manager.get_property("api-key", None).await.unwrap().unwrap();
    assert_eq!(raw.as_str(), reference.value);
}

#[tokio::test]
async fn test_cached_manager_update_and_overrides_at_runtime() {
    let file = write_settings(".json", r#"{"cacheControls": {"cache": true}}"#);
    let source = MockSource::new("origin").with_value("feature", "off");

    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_env_source(no_env())
        .with_settings_file(file.path())
        .unwrap()
        .with_source(source.clone())
        .build()
        .unwrap();

    let cache = manager.cache().unwrap().clone();
    assert_eq!(
        manager.get_property("feature", None).await.unwrap().unwrap().as_str(),
        "off"
    );

    assert!(cache.update_cached("feature", "on"));
    assert_eq!(
        manager.get_property("feature", None).await.unwrap().unwrap().as_str(),
        "on"
    );
    assert_eq!(source.calls(), 1);

    cache.set_cache("feature", false, None).unwrap();
    source.set("feature", "origin");
    assert_eq!(
        manager.get_property("feature", None).await.unwrap().unwrap().as_str(),
        "origin"
    );
    assert!(!cache.update_cached("feature", "ignored"));
    assert!(!cache.update_cached("never-seen", "ignored"));
}
