// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic usage of the property manager.
//!
//! This demo resolves properties from the process environment, with caching
//! enabled through an inline settings document, and reads them through a
//! namespaced view.
//!
//! To run it:
//! ```bash
//! env 'db-host=db.internal' 'db-port=5432' cargo run --example basic_usage
//! ```

use chaincfg::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = PropertyManagerSettings::from_json_str(
        r#"{ "cacheControls": { "cache": true, "maxAge": "2m" } }"#,
    )?;

    let manager = PropertyManager::builder()
        .with_environment("development")
        .with_settings(settings)
        .build()?;
    println!("sources: {:?}", manager.source_names());

    let db = manager.namespace("db");

    let host = db.get_property("host", Some("localhost")).await?;
    println!("db-host = {}", host.map(|v| v.as_string()).unwrap_or_default());

    let port = match db.get_property("port", None).await? {
        Some(value) => value.as_u64("db-port")?,
        None => 5432,
    };
    println!("db-port = {}", port);

    // The second lookup is answered from the cache.
    db.get_property("host", Some("localhost")).await?;
    if let Some(cache) = manager.cache() {
        println!("cached entry for db-host: {:?}", cache.cache_entry("db-host").is_some());
    }

    Ok(())
}
