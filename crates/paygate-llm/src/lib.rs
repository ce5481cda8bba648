//! paygate-llm - Document model provider implementations for paygate.
//!
//! # Supported Providers
//!
//! - **Anthropic** - Claude models through the Messages API, with PDF
//!   documents sent as `document` blocks and scans as `image` blocks.
//!
//! # Example
//!
//! ```ignore
//! use paygate_core::GatewayConfig;
//! use paygate_llm::ModelFactory;
//!
//! let config = GatewayConfig::from_env()?;
//! let model = ModelFactory::from_config(&config)?;
//! ```

mod anthropic;
mod factory;

pub use anthropic::AnthropicModel;
pub use factory::{ModelFactory, ModelProvider};

// Re-export core types for convenience
pub use paygate_core::traits::{DocumentModel, ModelConfig, RawModelResponse, TokenUsage};
