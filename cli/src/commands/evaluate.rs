// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Run one evaluation from the command line
//!
//! Delegates to a running service when its health probe answers, otherwise
//! evaluates in-process against the configured store.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use pairwise_core::domain::evaluation::EvaluationRequest;
use pairwise_core::domain::provider::Provider;
use pairwise_core::domain::service_config::EvaluatorConfigManifest;

use crate::daemon::{check_service_running, ServiceClient, ServiceStatus};
use crate::embedded::EmbeddedEvaluator;

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Task identifier in the evaluations table
    #[arg(long, value_name = "ID")]
    pub task_id: i64,

    /// Provider to ask (openai, gemini)
    #[arg(long, default_value = "openai")]
    pub provider: Provider,

    /// Parameter preset (text, reasoning, or a configured override)
    #[arg(long, default_value = "text")]
    pub model_type: String,

    /// Service host to delegate to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Service port to delegate to (default: server.port from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Always evaluate in-process
    #[arg(long)]
    pub embedded: bool,
}

/// Print the outcome body; `Ok(false)` means the evaluation failed
pub async fn handle_command(args: EvaluateArgs, config: EvaluatorConfigManifest) -> Result<bool> {
    let request = EvaluationRequest::new(args.task_id, args.provider, args.model_type.to_lowercase());
    let port = args.port.unwrap_or(config.spec.server.port);

    if !args.embedded {
        if let ServiceStatus::Running { .. } = check_service_running(&args.host, port).await? {
            info!("Delegating to service at {}:{}", args.host, port);
            // Allow the provider call its full budget plus slack
            let timeout = Duration::from_secs(config.spec.request_timeout_secs + 30);
            let client = ServiceClient::new(&args.host, port, timeout)?;
            let outcome = client.evaluate(&request).await?;
            print_body(&outcome.body)?;
            return Ok(outcome.is_success());
        }
    }

    info!("Evaluating in-process");
    let evaluator = EmbeddedEvaluator::new(&config)?;
    let outcome = evaluator.evaluate(request).await;
    print_body(&outcome.to_json())?;
    Ok(outcome.is_success())
}

fn print_body(body: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(body).context("Failed to render outcome")?;
    if body.get("error").is_some() {
        eprintln!("{}", text.red());
    } else {
        println!("{}", text);
    }
    Ok(())
}
