//! Configuration system for paygate.
//!
//! Settings come from an optional config file (TOML, JSON or YAML) overlaid with
//! environment variables. The provider credential is only ever read from the
//! environment and is required: [`GatewayConfig::validate`] fails with a
//! configuration error when it is missing, so the server can refuse to start
//! before accepting any request.

use std::path::Path;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::schema::{SchemaRegistry, SchemaVersion};
use crate::traits::ModelConfig;

/// Environment variable holding the provider credential.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
/// Environment variable pointing at an optional config file.
pub const CONFIG_PATH_VAR: &str = "PAYGATE_CONFIG";

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body (the base64 document dominates it).
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Main gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Model provider name (defaults to Anthropic).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model client configuration.
    pub model: ModelConfig,
    /// HTTP listener configuration.
    pub server: ServerConfig,
    /// Schema used when a request names none (defaults to the latest version).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: ModelConfig::default(),
            server: ServerConfig::default(),
            default_schema: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| GatewayError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| GatewayError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| GatewayError::Configuration(e.to_string())),
            _ => Err(GatewayError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from the process environment and validate it.
    ///
    /// If `PAYGATE_CONFIG` is set, that file is loaded first and environment
    /// variables override it.
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup and validate it.
    pub fn from_lookup<F>(lookup: F) -> GatewayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(CONFIG_PATH_VAR) {
            Some(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        let config = base.with_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides.
    pub fn with_overrides<F>(mut self, lookup: F) -> GatewayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_VAR) {
            self.model.api_key = Some(SecretString::new(key));
        }
        if let Some(provider) = lookup("PAYGATE_PROVIDER") {
            self.provider = Some(provider);
        }
        if let Some(model) = lookup("PAYGATE_MODEL") {
            self.model.model = model;
        }
        if let Some(value) = lookup("PAYGATE_MAX_TOKENS") {
            self.model.max_tokens = parse_var("PAYGATE_MAX_TOKENS", &value)?;
        }
        if let Some(value) = lookup("PAYGATE_TIMEOUT_SECS") {
            self.model.timeout_secs = parse_var("PAYGATE_TIMEOUT_SECS", &value)?;
        }
        if let Some(url) = lookup("PAYGATE_BASE_URL") {
            self.model.base_url = Some(url);
        }
        if let Some(schema) = lookup("PAYGATE_DEFAULT_SCHEMA") {
            self.default_schema = Some(schema);
        }
        if let Some(host) = lookup("PAYGATE_HOST") {
            self.server.host = host;
        }
        if let Some(value) = lookup("PAYGATE_PORT") {
            self.server.port = parse_var("PAYGATE_PORT", &value)?;
        }
        if let Some(value) = lookup("PAYGATE_BODY_LIMIT_BYTES") {
            self.server.body_limit_bytes = parse_var("PAYGATE_BODY_LIMIT_BYTES", &value)?;
        }
        Ok(self)
    }

    /// Check that the configuration can serve requests.
    pub fn validate(&self) -> GatewayResult<()> {
        let has_key = self
            .model
            .api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty());
        if !has_key {
            return Err(GatewayError::Configuration(format!(
                "API key not configured. Set the {} environment variable.",
                API_KEY_VAR
            )));
        }
        if self.model.max_tokens == 0 {
            return Err(GatewayError::Configuration(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(GatewayError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.default_schema_version()?;
        Ok(())
    }

    /// Resolve the configured default schema.
    pub fn default_schema_version(&self) -> GatewayResult<SchemaVersion> {
        SchemaRegistry::global()
            .resolve(self.default_schema.as_deref())
            .map(|d| d.version)
            .map_err(|_| {
                GatewayError::Configuration(format!(
                    "Unknown default schema '{}'",
                    self.default_schema.as_deref().unwrap_or_default()
                ))
            })
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> GatewayResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GatewayError::Configuration(format!("{} has an invalid value", name)))
}

/// Builder for GatewayConfig.
#[derive(Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    /// Set the provider credential.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.model.api_key = Some(SecretString::new(key.into()));
        self
    }

    /// Set the model provider name.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.config.provider = Some(provider.into());
        self
    }

    /// Set model configuration.
    pub fn model(mut self, config: ModelConfig) -> Self {
        self.config.model = config;
        self
    }

    /// Set server configuration.
    pub fn server(mut self, config: ServerConfig) -> Self {
        self.config.server = config;
        self
    }

    /// Set the default schema selector.
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.config.default_schema = Some(schema.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GatewayConfig {
        self.config
    }
}
