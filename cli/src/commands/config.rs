// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use pairwise_core::domain::model_config::ModelRegistry;
use pairwise_core::domain::provider::Provider;
use pairwise_core::domain::service_config::{EvaluatorConfigManifest, StoreBackendKind};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./pairwise-config.yaml)
        #[arg(short, long, default_value = "./pairwise-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = EvaluatorConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. PAIRWISE_CONFIG_PATH: {}",
            std::env::var("PAIRWISE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./pairwise-config.yaml");
        println!("  4. ~/.pairwise/config.yaml");
        println!("  5. /etc/pairwise/config.yaml");
        println!();
    }

    let spec = &config.spec;

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Service:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    println!("  Request timeout: {}s", spec.request_timeout_secs);
    println!();

    println!("{}", "Store:".bold());
    match spec.database.backend {
        StoreBackendKind::InMemory => println!("  Backend: in-memory"),
        StoreBackendKind::Postgres => {
            println!("  Backend: postgres");
            if spec.database.url.is_some() {
                // The url may embed a password
                println!("  URL: {}", "(set)".dimmed());
            } else {
                println!(
                    "  Host: {}:{}",
                    spec.database.host.as_deref().unwrap_or("(none)"),
                    spec.database.port.unwrap_or(5432)
                );
                println!("  Database: {}", spec.database.database.as_deref().unwrap_or("(default)"));
                println!("  Schema: {}", spec.database.schema.as_deref().unwrap_or("(default)"));
            }
            println!("  Pool size: {}", spec.database.max_connections);
        }
    }
    println!("  Evaluations table: {}", spec.tables.evaluations);
    println!("  Templates table: {}", spec.tables.prompt_templates);
    println!(
        "  Template order: {} DESC NULLS LAST, {} DESC",
        spec.tables.template_order_column, spec.tables.template_id_column
    );
    println!();

    let models = ModelRegistry::from_config(spec);
    println!("{}", "LLM Providers:".bold());
    for provider in Provider::ALL {
        let endpoint = spec.providers.get(provider);
        let state = if endpoint.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        println!("  {} ({})", provider.as_str().bold(), state);
        println!("    Endpoint: {}", endpoint.endpoint);
        println!("    Credential: {}", describe_credential(&endpoint.api_key));
        for model_type in models.model_types(provider) {
            if let Ok(params) = models.resolve(provider, model_type) {
                println!(
                    "      - {} → {} (temperature {}, max_tokens {}, top_p {})",
                    model_type, params.model, params.temperature, params.max_tokens, params.top_p
                );
            }
        }
    }
    println!();

    Ok(())
}

/// Never print literal keys
fn describe_credential(raw: &str) -> String {
    match raw.strip_prefix("env:") {
        Some(var) => format!("env:{}", var),
        None if raw.is_empty() => "(none)".to_string(),
        None => "(literal)".to_string(),
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = EvaluatorConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn sample(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    std::fs::write(output, sample(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_parse_and_validate() {
        for with_examples in [false, true] {
            let config = EvaluatorConfigManifest::from_yaml_str(sample(with_examples)).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_example_sample_registers_extra_model() {
        let config = EvaluatorConfigManifest::from_yaml_str(sample(true)).unwrap();
        let models = ModelRegistry::from_config(&config.spec);
        let params = models.resolve(Provider::OpenAI, "long-form").unwrap();
        assert_eq!(params.model, "gpt-4o");
    }

    #[test]
    fn test_credentials_are_not_echoed() {
        assert_eq!(describe_credential("env:OPENAI_API_KEY"), "env:OPENAI_API_KEY");
        assert_eq!(describe_credential("sk-live-123"), "(literal)");
        assert_eq!(describe_credential(""), "(none)");
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairwise-config.yaml");
        generate(&path, false).await.unwrap();

        let loaded = EvaluatorConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.spec.server.port, 5005);
    }
}
