// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Pairwise Evaluator CLI
//!
//! The `pairwise` binary runs the pairwise evaluation HTTP service and
//! offers the same evaluation from the command line.
//!
//! ## Commands
//!
//! - `pairwise serve` - Run the HTTP service (`POST /ai`, `GET /health`)
//! - `pairwise evaluate --task-id N` - Evaluate one task (delegates to a running service if present)
//! - `pairwise status` - Probe a running service
//! - `pairwise config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use pairwise_core::domain::service_config::EvaluatorConfigManifest;
use pairwise_orchestrator::commands::{self, ConfigCommand, EvaluateArgs};
use pairwise_orchestrator::daemon;

/// Pairwise Evaluator - compare two responses with an LLM judge
#[derive(Parser)]
#[command(name = "pairwise")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "PAIRWISE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PAIRWISE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "PAIRWISE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP evaluation service
    #[command(name = "serve")]
    Serve {
        /// Bind address (default: server.bind_address from config)
        #[arg(long)]
        host: Option<String>,

        /// Port (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Evaluate one task and print the outcome
    #[command(name = "evaluate")]
    Evaluate(EvaluateArgs),

    /// Check whether the service is running
    #[command(name = "status")]
    Status {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            let config = load_config(cli.config)?;
            daemon::start_server(config, host, port).await
        }
        Some(Commands::Evaluate(args)) => {
            let config = load_config(cli.config)?;
            if !commands::evaluate::handle_command(args, config).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Status { host, port }) => {
            let port = match port {
                Some(port) => port,
                None => load_config(cli.config)?.spec.server.port,
            };
            if !commands::status::handle_command(&host, port).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EvaluatorConfigManifest> {
    EvaluatorConfigManifest::load_or_default(path).context("Failed to load configuration")
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
