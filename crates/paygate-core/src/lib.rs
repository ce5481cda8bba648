//! paygate-core - Core library for paygate.
//!
//! This crate provides the schema registry, instruction builder, response
//! normalizer and extraction pipeline for the paygate pay application
//! extraction gateway.
//!
//! # Example
//!
//! ```ignore
//! use paygate_core::{ExtractionPipeline, ExtractionRequest};
//!
//! let pipeline = ExtractionPipeline::new(model);
//! let request = ExtractionRequest::from_base64(Some(&base64_pdf), Some("v3-billable"))?;
//!
//! let result = pipeline.run(&request).await?;
//! for item in &result.line_items {
//!     println!("{}: {:?}", item.description, item.work_completed_this_period);
//! }
//! ```

pub mod config;
pub mod error;
pub mod instructions;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{GatewayConfig, ServerConfig};
pub use error::{ErrorCode, ErrorKind, GatewayError, GatewayResult};
pub use instructions::build_instructions;
pub use normalize::{normalize, normalize_text};
pub use pipeline::ExtractionPipeline;
pub use schema::{SchemaDefinition, SchemaRegistry, SchemaVersion};
pub use traits::{DocumentModel, ModelConfig, RawModelResponse, TokenUsage};
pub use types::{
    Document, DocumentKind, ExtractionRequest, ExtractionResult, ExtractionStatus, G702Totals,
    Issue, IssueKind, LineItem, ProjectInfo,
};
