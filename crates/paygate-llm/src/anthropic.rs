//! Anthropic (Claude) document model implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use paygate_core::error::{sanitize_excerpt, ErrorCode, GatewayError, GatewayResult, MAX_EXCERPT_CHARS};
use paygate_core::traits::{DocumentModel, ModelConfig, RawModelResponse, TokenUsage};
use paygate_core::types::Document;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client for document extraction.
pub struct AnthropicModel {
    client: Client,
    config: ModelConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Document { source: Base64Source },
    Image { source: Base64Source },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct Base64Source {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicModel {
    /// Create a new Anthropic document model.
    pub fn new(config: ModelConfig) -> GatewayResult<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                GatewayError::Configuration(
                    "Anthropic API key not found. Set the ANTHROPIC_API_KEY environment variable."
                        .to_string(),
                )
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut key_header: reqwest::header::HeaderValue = api_key
            .parse()
            .map_err(|_| GatewayError::Configuration("Invalid API key format".to_string()))?;
        key_header.set_sensitive(true);
        headers.insert("x-api-key", key_header);
        headers.insert(
            "anthropic-version",
            ANTHROPIC_VERSION
                .parse()
                .map_err(|_| GatewayError::Configuration("Invalid version header".to_string()))?,
        );
        headers.insert(
            "content-type",
            "application/json"
                .parse()
                .map_err(|_| GatewayError::Configuration("Invalid content type".to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config
            .base_url
            .clone()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn build_request<'a>(&'a self, document: &Document, instructions: &'a str) -> AnthropicRequest<'a> {
        let source = Base64Source {
            source_type: "base64",
            media_type: document.kind().media_type(),
            data: document.to_base64(),
        };
        let attachment = if document.kind().is_image() {
            ContentBlock::Image { source }
        } else {
            ContentBlock::Document { source }
        };

        AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![attachment, ContentBlock::Text { text: instructions }],
            }],
        }
    }

    fn send_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::upstream(
                ErrorCode::UpsTimeout,
                format!("Model request timed out after {}s", self.config.timeout_secs),
            )
        } else {
            let detail = sanitize_excerpt(&err.to_string(), MAX_EXCERPT_CHARS);
            GatewayError::transport(format!("Model request failed: {}", detail), err)
        }
    }
}

#[async_trait]
impl DocumentModel for AnthropicModel {
    async fn extract(
        &self,
        document: &Document,
        instructions: &str,
    ) -> GatewayResult<RawModelResponse> {
        let request = self.build_request(document, instructions);

        debug!(
            model = %self.config.model,
            max_tokens = self.config.max_tokens,
            media_type = document.kind().media_type(),
            "Sending document to Anthropic"
        );

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            let error: Result<AnthropicError, _> = serde_json::from_str(&body);
            let message = error.map(|e| e.error.message).unwrap_or(body);
            warn!(status = status.as_u16(), "Anthropic API returned an error status");
            return Err(GatewayError::provider_status(status.as_u16(), &message));
        }

        if body.trim().is_empty() {
            return Err(GatewayError::upstream(
                ErrorCode::UpsEmptyResponse,
                "Model provider returned an empty body",
            ));
        }

        let response: AnthropicResponse = serde_json::from_str(&body).map_err(|e| {
            GatewayError::upstream(
                ErrorCode::UpsUnreadableResponse,
                format!("Model provider response could not be read: {}", e),
            )
        })?;

        let text = response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(GatewayError::upstream(
                ErrorCode::UpsEmptyResponse,
                "Model provider returned no text content",
            ));
        }

        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        });

        Ok(RawModelResponse {
            text,
            status: status.as_u16(),
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
            stop_reason: response.stop_reason,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
