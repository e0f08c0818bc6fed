// SPDX-License-Identifier: MIT OR Apache-2.0

//! Docker helpers shared by the container-backed integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

static DOCKER_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// True if `docker ps` succeeds. Checked once per test binary.
pub fn is_docker_available() -> bool {
    *DOCKER_AVAILABLE.get_or_init(|| {
        std::process::Command::new("docker")
            .arg("ps")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    })
}

/// Reports a test skipped for lack of Docker.
pub fn skip_without_docker(test_name: &str) {
    eprintln!("SKIPPED: {} (Docker is not available)", test_name);
}

#[cfg(feature = "redis")]
pub mod redis {
    use testcontainers::{core::WaitFor, runners::AsyncRunner, ContainerAsync, GenericImage, ImageExt};

    /// A running Redis container and the URL it listens on.
    pub struct RedisFixture {
        pub url: String,
        _container: ContainerAsync<GenericImage>,
    }

    impl RedisFixture {
        /// Opens a plain connection for seeding data.
        pub async fn connection(&self) -> ::redis::aio::MultiplexedConnection {
            self.connection_with_password(None).await
        }

        /// Opens a connection, authenticating when `password` is given.
        pub async fn connection_with_password(
            &self,
            password: Option<&str>,
        ) -> ::redis::aio::MultiplexedConnection {
            use ::redis::IntoConnectionInfo;

            let mut info = self.url.as_str().into_connection_info().unwrap();
            info.redis.password = password.map(str::to_string);
            ::redis::Client::open(info)
                .unwrap()
                .get_multiplexed_async_connection()
                .await
                .unwrap()
        }
    }

    /// Starts `redis:7-alpine`, optionally requiring `password`.
    ///
    /// Returns `None` (after printing a notice) when Docker is unavailable or
    /// the container fails to start.
    pub async fn start_redis(test_name: &str, password: Option<&str>) -> Option<RedisFixture> {
        if !super::is_docker_available() {
            super::skip_without_docker(test_name);
            return None;
        }

        let mut cmd = vec!["redis-server".to_string()];
        if let Some(password) = password {
            cmd.push("--requirepass".to_string());
            cmd.push(password.to_string());
        }

        let container = GenericImage::new("redis", "7-alpine")
            .with_exposed_port(6379.into())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .with_cmd(cmd)
            .start()
            .await
            .ok()?;
        let port = container.get_host_port_ipv4(6379).await.ok()?;

        Some(RedisFixture {
            url: format!("redis://127.0.0.1:{}", port),
            _container: container,
        })
    }
}
