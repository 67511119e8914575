// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration manifest for the pairwise evaluator, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server binding
// - Relational store connection and table names
// - Provider endpoints and credentials ("env:VAR_NAME" support)
// - Model parameter overrides
// - Observability settings

use crate::domain::model_config::ModelOverride;
use crate::domain::provider::Provider;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const API_VERSION: &str = "pairwise.ai/v1";
pub const KIND: &str = "EvaluatorConfig";

/// Top-level Kubernetes-style service configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfigManifest {
    /// API version (must be "pairwise.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "EvaluatorConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: EvaluatorConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Manifest body (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub tables: TableConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Upper bound for a single outbound provider call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Additions and overrides to the built-in model table
    #[serde(default)]
    pub models: Vec<ModelOverride>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

impl Default for EvaluatorConfigSpec {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            tables: TableConfig::default(),
            providers: ProvidersConfig::default(),
            request_timeout_secs: default_request_timeout(),
            models: vec![],
            observability: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackendKind {
    #[default]
    Postgres,
    InMemory,
}

/// Relational store connection parameters
///
/// Either `url` or the individual components may be given. `password`
/// accepts the "env:VAR_NAME" syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackendKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Search path applied to every session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::default(),
            url: None,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            schema: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

/// Table and column names interpolated into SQL text.
/// Only identifier-shaped values pass validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_evaluations_table")]
    pub evaluations: String,

    #[serde(default = "default_prompt_templates_table")]
    pub prompt_templates: String,

    /// Creation-order column; the newest active template wins, NULLs last
    #[serde(default = "default_template_order_column")]
    pub template_order_column: String,

    /// Unique column breaking ties on the order column; highest wins
    #[serde(default = "default_template_id_column")]
    pub template_id_column: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            evaluations: default_evaluations_table(),
            prompt_templates: default_prompt_templates_table(),
            template_order_column: default_template_order_column(),
            template_id_column: default_template_id_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_openai_config")]
    pub openai: ProviderEndpointConfig,

    #[serde(default = "default_gemini_config")]
    pub gemini: ProviderEndpointConfig,
}

impl ProvidersConfig {
    pub fn get(&self, provider: Provider) -> &ProviderEndpointConfig {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Gemini => &self.gemini,
        }
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.get(provider).enabled
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: default_openai_config(),
            gemini: default_gemini_config(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpointConfig {
    /// API base URL
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    pub api_key: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Where a credential comes from. Environment references are resolved at
/// call time so a rotated key is picked up without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Env(String),
    Literal(String),
}

impl CredentialSource {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("env:") {
            Some(var) => Self::Env(var.to_string()),
            None => Self::Literal(raw.to_string()),
        }
    }

    pub fn resolve(&self) -> Result<String, String> {
        match self {
            Self::Env(var) => match std::env::var(var) {
                Ok(value) if !value.is_empty() => Ok(value),
                _ => Err(format!("Environment variable not set: {}", var)),
            },
            Self::Literal(value) => Ok(value.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5005
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_evaluations_table() -> String {
    "pairwise_evaluations".to_string()
}

fn default_prompt_templates_table() -> String {
    "prompt_templates".to_string()
}

fn default_template_order_column() -> String {
    "created_at".to_string()
}

fn default_template_id_column() -> String {
    "id".to_string()
}

fn default_openai_config() -> ProviderEndpointConfig {
    ProviderEndpointConfig {
        endpoint: "https://api.openai.com/v1".to_string(),
        api_key: format!("env:{}", Provider::OpenAI.default_api_key_env()),
        enabled: true,
    }
}

fn default_gemini_config() -> ProviderEndpointConfig {
    ProviderEndpointConfig {
        endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        api_key: format!("env:{}", Provider::Gemini.default_api_key_env()),
        enabled: true,
    }
}

/// `name` or `schema.name`, letters/digits/underscores only
pub fn is_sql_identifier(value: &str) -> bool {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
                .expect("identifier pattern is valid")
        })
        .is_match(value)
}

impl Default for EvaluatorConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "pairwise-evaluator".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: EvaluatorConfigSpec::default(),
        }
    }
}

impl EvaluatorConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. PAIRWISE_CONFIG_PATH environment variable
    /// 2. ./pairwise-config.yaml (working directory)
    /// 3. ~/.pairwise/config.yaml (user home)
    /// 4. /etc/pairwise/config.yaml (system, Unix) or C:\ProgramData\Pairwise\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PAIRWISE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./pairwise-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".pairwise").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/pairwise/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Pairwise\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as `apply_env_overrides` with an injectable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &mut self.spec.database;
        let string_overrides: [(&str, &mut Option<String>); 6] = [
            ("PAIRWISE_DATABASE_URL", &mut db.url),
            ("PAIRWISE_DB_HOST", &mut db.host),
            ("PAIRWISE_DB_USER", &mut db.user),
            ("PAIRWISE_DB_PASSWORD", &mut db.password),
            ("PAIRWISE_DB_NAME", &mut db.database),
            ("PAIRWISE_DB_SCHEMA", &mut db.schema),
        ];
        for (key, slot) in string_overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                tracing::info!("Environment override: {}", key);
                *slot = Some(value);
            }
        }

        if let Some(value) = lookup("PAIRWISE_DB_PORT") {
            match value.parse::<u16>() {
                Ok(port) => db.port = Some(port),
                Err(_) => tracing::warn!(
                    "Invalid value for PAIRWISE_DB_PORT: '{}'. Expected a port number. Ignoring.",
                    value
                ),
            }
        }

        if let Some(value) = lookup("PAIRWISE_EVALUATION_TABLE").filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: PAIRWISE_EVALUATION_TABLE={}", value);
            self.spec.tables.evaluations = value;
        }

        if let Some(value) = lookup("PROMPT_TEMPLATES_TABLE").filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: PROMPT_TEMPLATES_TABLE={}", value);
            self.spec.tables.prompt_templates = value;
        }

        if let Some(value) = lookup("PAIRWISE_PORT") {
            match value.parse::<u16>() {
                Ok(port) => self.spec.server.port = port,
                Err(_) => tracing::warn!(
                    "Invalid value for PAIRWISE_PORT: '{}'. Expected a port number. Ignoring.",
                    value
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;

        if spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }

        if spec.request_timeout_secs == 0 {
            anyhow::bail!("spec.request_timeout_secs must be positive");
        }

        let tables = &spec.tables;
        for (field, value) in [
            ("tables.evaluations", &tables.evaluations),
            ("tables.prompt_templates", &tables.prompt_templates),
            ("tables.template_order_column", &tables.template_order_column),
            ("tables.template_id_column", &tables.template_id_column),
        ] {
            if !is_sql_identifier(value) {
                anyhow::bail!("{} is not a valid SQL identifier: '{}'", field, value);
            }
        }

        if spec.database.backend == StoreBackendKind::Postgres {
            if spec.database.url.is_none() && spec.database.host.is_none() {
                anyhow::bail!("database.url or database.host is required for the postgres backend");
            }
            if spec.database.max_connections == 0 {
                anyhow::bail!("database.max_connections must be positive");
            }
        }

        for provider in Provider::ALL {
            let endpoint = spec.providers.get(provider);
            if endpoint.enabled && endpoint.endpoint.is_empty() {
                anyhow::bail!("Provider endpoint cannot be empty for: {}", provider);
            }
        }

        for entry in &spec.models {
            let params = &entry.parameters;
            if entry.model_type.is_empty() {
                anyhow::bail!("Model type cannot be empty for provider: {}", entry.provider);
            }
            if params.model.is_empty() {
                anyhow::bail!(
                    "Model identifier cannot be empty for {}/{}",
                    entry.provider,
                    entry.model_type
                );
            }
            if !(0.0..=2.0).contains(&params.temperature) {
                anyhow::bail!(
                    "Temperature for {}/{} must be within 0.0-2.0",
                    entry.provider,
                    entry.model_type
                );
            }
            if params.max_tokens == 0 {
                anyhow::bail!(
                    "max_tokens for {}/{} must be positive",
                    entry.provider,
                    entry.model_type
                );
            }
            if !(params.top_p > 0.0 && params.top_p <= 1.0) {
                anyhow::bail!(
                    "top_p for {}/{} must be within (0.0, 1.0]",
                    entry.provider,
                    entry.model_type
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model_config::ModelParameters;

    fn postgres_manifest() -> EvaluatorConfigManifest {
        let mut manifest = EvaluatorConfigManifest::default();
        manifest.spec.database.url = Some("postgres://localhost/pairwise".to_string());
        manifest
    }

    #[test]
    fn test_default_manifest() {
        let manifest = EvaluatorConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert!(!manifest.metadata.name.is_empty());
        assert_eq!(manifest.spec.server.port, 5005);
        assert_eq!(manifest.spec.tables.evaluations, "pairwise_evaluations");
        assert_eq!(manifest.spec.providers.openai.api_key, "env:OPENAI_API_KEY");
        assert_eq!(manifest.spec.request_timeout_secs, 60);
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: pairwise.ai/v1
kind: EvaluatorConfig
metadata:
  name: eval-node
spec:
  database:
    backend: in-memory
  providers:
    gemini:
      endpoint: http://localhost:9999
      api_key: literal-key
      enabled: false
"#;
        let manifest = EvaluatorConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.database.backend, StoreBackendKind::InMemory);
        assert_eq!(manifest.spec.server.bind_address, "0.0.0.0");
        assert!(manifest.spec.providers.is_enabled(Provider::OpenAI));
        assert!(!manifest.spec.providers.is_enabled(Provider::Gemini));
        assert_eq!(manifest.spec.tables.template_order_column, "created_at");
        assert_eq!(manifest.spec.tables.template_id_column, "id");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairwise-config.yaml");

        let mut manifest = postgres_manifest();
        manifest.metadata.name = "file-node".to_string();
        manifest.spec.tables.evaluations = "analytics.pairwise_tasks".to_string();
        manifest.to_yaml_file(&path).unwrap();

        let parsed = EvaluatorConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(parsed.metadata.name, "file-node");
        assert_eq!(parsed.spec.tables.evaluations, "analytics.pairwise_tasks");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result =
            EvaluatorConfigManifest::load_or_default(Some(PathBuf::from("/nonexistent/pairwise.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut manifest = EvaluatorConfigManifest::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("PAIRWISE_DB_HOST", "db.internal"),
            ("PAIRWISE_DB_PORT", "6543"),
            ("PAIRWISE_DB_PASSWORD", "env:PG_SECRET"),
            ("PAIRWISE_EVALUATION_TABLE", "eval_tasks"),
            ("PROMPT_TEMPLATES_TABLE", "eval_templates"),
            ("PAIRWISE_PORT", "not-a-port"),
        ]);
        manifest.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        let db = &manifest.spec.database;
        assert_eq!(db.host.as_deref(), Some("db.internal"));
        assert_eq!(db.port, Some(6543));
        assert_eq!(db.password.as_deref(), Some("env:PG_SECRET"));
        assert_eq!(manifest.spec.tables.evaluations, "eval_tasks");
        assert_eq!(manifest.spec.tables.prompt_templates, "eval_templates");
        // Invalid port is ignored
        assert_eq!(manifest.spec.server.port, 5005);
    }

    #[test]
    fn test_validation() {
        let mut manifest = postgres_manifest();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.tables.evaluations = "tasks; DROP TABLE tasks".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.tables.evaluations = "pairwise_evaluations".to_string();

        manifest.spec.tables.template_id_column = "id DESC, 1".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.tables.template_id_column = "id".to_string();

        manifest.spec.database.url = None;
        assert!(manifest.validate().is_err());
        manifest.spec.database.backend = StoreBackendKind::InMemory;
        assert!(manifest.validate().is_ok());

        manifest.spec.models.push(ModelOverride {
            provider: Provider::OpenAI,
            model_type: "hot".to_string(),
            parameters: ModelParameters::new("gpt-4o", 2.5, 100),
        });
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_sql_identifier() {
        assert!(is_sql_identifier("prompt_templates"));
        assert!(is_sql_identifier("public.PROMPT_TEMPLATES"));
        assert!(!is_sql_identifier("1table"));
        assert!(!is_sql_identifier("a.b.c"));
        assert!(!is_sql_identifier("name\"--"));
        assert!(!is_sql_identifier(""));
    }

    #[test]
    fn test_credential_source() {
        assert_eq!(
            CredentialSource::parse("env:OPENAI_API_KEY"),
            CredentialSource::Env("OPENAI_API_KEY".to_string())
        );
        assert_eq!(
            CredentialSource::parse("sk-literal").resolve().unwrap(),
            "sk-literal"
        );
        let missing = CredentialSource::Env("PAIRWISE_TEST_UNSET_CREDENTIAL_7F3A".to_string());
        assert!(missing.resolve().unwrap_err().contains("PAIRWISE_TEST_UNSET_CREDENTIAL_7F3A"));
    }
}
