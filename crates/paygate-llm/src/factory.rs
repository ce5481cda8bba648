//! Factory for creating document models.

use std::str::FromStr;
use std::sync::Arc;

use paygate_core::config::GatewayConfig;
use paygate_core::error::{GatewayError, GatewayResult};
use paygate_core::traits::{DocumentModel, ModelConfig};

use crate::anthropic::AnthropicModel;

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelProvider {
    #[default]
    Anthropic,
}

impl FromStr for ModelProvider {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(GatewayError::Configuration(format!(
                "Unsupported model provider '{}'",
                other
            ))),
        }
    }
}

/// Factory for creating document models.
pub struct ModelFactory;

impl ModelFactory {
    /// Create a document model from the given configuration.
    pub fn create(
        provider: ModelProvider,
        config: ModelConfig,
    ) -> GatewayResult<Arc<dyn DocumentModel>> {
        match provider {
            ModelProvider::Anthropic => {
                let model = AnthropicModel::new(config)?;
                Ok(Arc::new(model))
            }
        }
    }

    /// Create the document model described by a gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Arc<dyn DocumentModel>> {
        let provider = match config.provider.as_deref() {
            Some(name) => name.parse()?,
            None => ModelProvider::default(),
        };
        Self::create(provider, config.model.clone())
    }
}
