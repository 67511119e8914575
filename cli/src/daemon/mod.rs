// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service mode implementation
//!
//! Handles:
//! - HTTP server bootstrap
//! - Health checks against a running service
//! - Graceful shutdown

use anyhow::Result;
use std::time::Duration;

pub mod client;
pub mod server;

pub use client::ServiceClient;
pub use server::start_server;

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStatus {
    Running { uptime: Option<u64> },
    Stopped,
    Unhealthy { error: String },
}

/// Base URL for a host/port pair; a host may already carry a scheme
pub fn base_url(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Check whether the service answers its health probe
pub async fn check_service_running(host: &str, port: u16) -> Result<ServiceStatus> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()?;

    let health_url = format!("{}/health", base_url(host, port));

    match client.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let uptime = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["uptime_seconds"].as_u64());
            Ok(ServiceStatus::Running { uptime })
        }
        Ok(resp) => Ok(ServiceStatus::Unhealthy {
            error: format!("HTTP {}", resp.status()),
        }),
        Err(e) if e.is_connect() || e.is_timeout() => Ok(ServiceStatus::Stopped),
        Err(e) => Ok(ServiceStatus::Unhealthy {
            error: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("127.0.0.1", 5005), "http://127.0.0.1:5005");
        assert_eq!(base_url("https://eval.internal", 443), "https://eval.internal:443");
    }

    #[tokio::test]
    async fn test_nothing_listening_is_stopped() {
        // Port 1 is privileged and never bound in test environments
        let status = check_service_running("127.0.0.1", 1).await.unwrap();
        assert_eq!(status, ServiceStatus::Stopped);
    }
}
