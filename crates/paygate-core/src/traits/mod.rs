//! Core traits for paygate.

mod model;

pub use model::{DocumentModel, ModelConfig, RawModelResponse, TokenUsage};
