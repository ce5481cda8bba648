//! Server state management.

use std::sync::Arc;

use paygate_core::{DocumentModel, ExtractionPipeline, SchemaVersion};

/// Shared application state.
///
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ExtractionPipeline>,
    /// Version used when a request names none.
    pub default_schema: SchemaVersion,
}

impl AppState {
    /// Create a new application state around a document model.
    pub fn new(model: Arc<dyn DocumentModel>, default_schema: SchemaVersion) -> Self {
        Self {
            pipeline: Arc::new(ExtractionPipeline::new(model)),
            default_schema,
        }
    }
}
