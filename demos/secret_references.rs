// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote configuration with secret references.
//!
//! Two in-memory settings stores stand in for remote ones. The later store
//! overrides the earlier one, and a setting that references a secret resolves
//! to the secret's value.
//!
//! ```bash
//! cargo run --example secret_references
//! ```

use chaincfg::adapters::{MemorySecretClient, MemorySettingsClient};
use chaincfg::ports::RemoteSetting;
use chaincfg::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let shared = MemorySettingsClient::new("memory://shared")
        .with_setting("log-level", Some("production"), RemoteSetting::plain("info"))
        .with_setting("db-user", Some("production"), RemoteSetting::plain("app"));
    let team = MemorySettingsClient::new("memory://team")
        .with_setting("log-level", Some("production"), RemoteSetting::plain("debug"))
        .with_setting(
            "db-password",
            Some("production"),
            RemoteSetting::reference_to("https://vault.example/secrets/db-password"),
        );
    let vault = MemorySecretClient::new("memory://vault")
        .with_secret("https://vault.example/secrets/db-password", "correct-horse");

    let remote = RemoteConfigSource::new()
        .add_settings_client(Arc::new(shared))
        .add_settings_client(Arc::new(team))
        .set_secret_client(Arc::new(vault))
        .with_label("production");

    let mut properties = Properties::new(EnvVarSource::new());
    properties.add_source(Box::new(remote));

    for name in ["log-level", "db-user", "db-password", "db-port"] {
        match properties.get_property(name, None).await? {
            Some(value) => println!("{} = {}", name, value),
            None => println!("{} is not set", name),
        }
    }

    Ok(())
}
