//! Document model trait and related types.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::GatewayResult;
use crate::types::Document;

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt (document + instructions).
    pub input_tokens: u32,
    /// Tokens in the completion.
    pub output_tokens: u32,
}

/// Unparsed model output plus transport metadata.
///
/// The text is opaque: it may be JSON, JSON wrapped in prose, or not JSON at all.
#[derive(Debug, Clone, Default)]
pub struct RawModelResponse {
    /// Text produced by the model.
    pub text: String,
    /// HTTP status of the provider response.
    pub status: u16,
    /// Model that produced the text.
    pub model: String,
    /// Provider stop reason (`end_turn`, `max_tokens`, ...).
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl RawModelResponse {
    /// Response carrying only text, for tests and replays.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: 200,
            ..Default::default()
        }
    }

    /// Whether generation stopped because the output budget ran out.
    pub fn is_truncated(&self) -> bool {
        self.stop_reason.as_deref() == Some("max_tokens")
    }
}

/// External document-understanding model.
///
/// Implementations send the document and the instruction text as one request and
/// return whatever text comes back. They must not retry and must not interpret
/// the text. Transport failures, non-success statuses and empty bodies are
/// reported as upstream errors.
#[async_trait]
pub trait DocumentModel: Send + Sync {
    /// Run the model over a document.
    async fn extract(
        &self,
        document: &Document,
        instructions: &str,
    ) -> GatewayResult<RawModelResponse>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Model client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name/identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Provider credential. Never read from or written to config files.
    #[serde(skip)]
    pub api_key: Option<SecretString>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
            api_key: None,
            base_url: None,
        }
    }
}
