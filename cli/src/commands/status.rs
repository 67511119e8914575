// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Probe a running evaluation service

use anyhow::Result;
use colored::Colorize;

use crate::daemon::{check_service_running, ServiceStatus};

/// Print the service status; `Ok(false)` when it is not healthy
pub async fn handle_command(host: &str, port: u16) -> Result<bool> {
    match check_service_running(host, port).await? {
        ServiceStatus::Running { uptime } => {
            println!("{}", format!("✓ Service running at {}:{}", host, port).green());
            if let Some(secs) = uptime {
                println!("  Uptime: {}", format_uptime(secs));
            }
            Ok(true)
        }
        ServiceStatus::Stopped => {
            println!("{}", format!("Service not running at {}:{}", host, port).yellow());
            Ok(false)
        }
        ServiceStatus::Unhealthy { error } => {
            println!("{}", format!("✗ Service unhealthy at {}:{}: {}", host, port, error).red());
            Ok(false)
        }
    }
}

fn format_uptime(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
