//! # Application Configuration
//!
//! This module defines the configuration structure for the `promptdesk-server`
//! and loads it from a `config.yml` file layered with environment variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use promptdesk::{ProviderConfig, TextEncodingPolicy, TokenBudget};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding one `{category}.json` file per prompt category.
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
    /// Directory where saved conversations are written.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// The chat-completion provider.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Token budget for attachments and the assembled context.
    #[serde(default)]
    pub budget: TokenBudget,
    #[serde(default)]
    pub text_encoding_policy: TextEncodingPolicy,
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
    /// Maximum request body size for upload routes.
    #[serde(default = "default_upload_limit_bytes")]
    pub upload_limit_bytes: usize,
}

fn default_port() -> u16 {
    8000
}

fn default_prompts_dir() -> String {
    "prompts".to_string()
}

fn default_history_dir() -> String {
    "chat_history".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_extraction_timeout_secs() -> u64 {
    60
}

fn default_stream_idle_timeout_secs() -> u64 {
    120
}

fn default_upload_limit_bytes() -> usize {
    50 * 1024 * 1024
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(format!("Invalid substitution pattern: {e}")))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - `${VAR}` placeholders in the YAML are replaced from the environment.
/// - Top-level keys like `port` are overridden by `PORT`.
/// - Nested keys are overridden by `PROMPTDESK_...` variables
///   (e.g., `PROMPTDESK_PROVIDER__MODEL_NAME`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder();

    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let fallback_path = format!("{base_path}/config.default.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?.ok_or_else(|| {
        ConfigError::NotFound(format!(
            "Main config file not found at '{main_config_path}'. Please ensure 'config.yml' or 'config.default.yml' exists."
        ))
    })?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    let settings = builder
        // Top-level keys like PORT.
        .add_source(Environment::default())
        // Prefixed variables for nested overrides.
        .add_source(
            Environment::with_prefix("PROMPTDESK")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // An empty substitution leaves the key blank; fall back to the conventional variable.
    let key_missing = config
        .provider
        .api_key
        .as_deref()
        .is_none_or(|k| k.trim().is_empty());
    if key_missing {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.provider.api_key = Some(key);
            }
        }
    }

    Ok(config)
}
