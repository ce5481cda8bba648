//! Extraction pipeline: instructions, model call, normalization.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};
use crate::instructions::build_instructions;
use crate::normalize::normalize;
use crate::schema::SchemaRegistry;
use crate::traits::DocumentModel;
use crate::types::{ExtractionRequest, ExtractionResult, IssueKind};

/// Runs one document through one schema version.
///
/// The pipeline holds no per-request state and can be shared behind an `Arc`.
pub struct ExtractionPipeline {
    model: Arc<dyn DocumentModel>,
}

impl ExtractionPipeline {
    /// Create a pipeline around a model client.
    pub fn new(model: Arc<dyn DocumentModel>) -> Self {
        Self { model }
    }

    /// Name of the underlying model.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Extract a document.
    ///
    /// A response that contains no parseable JSON object is an upstream error;
    /// every other defect rides along as an issue on the returned result.
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), schema = %request.schema))]
    pub async fn run(&self, request: &ExtractionRequest) -> GatewayResult<ExtractionResult> {
        let schema = SchemaRegistry::global().get(request.schema)?;
        let document = &request.document;

        info!(
            fingerprint = %document.fingerprint(),
            bytes = document.len(),
            kind = ?document.kind(),
            "Extracting document"
        );

        let instructions = build_instructions(schema);
        let started = Instant::now();
        let raw = self.model.extract(document, &instructions).await?;

        info!(
            model = %raw.model,
            status = raw.status,
            stop_reason = raw.stop_reason.as_deref().unwrap_or("unknown"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model responded"
        );

        let result = normalize(&raw, schema);

        if let Some(issue) = result
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::MalformedJson)
        {
            warn!(reason = %issue.message, "Model output is not a JSON object");
            return Err(GatewayError::malformed_output(format!(
                "Model returned unparseable output: {}",
                issue.message
            )));
        }

        info!(
            status = %result.status,
            line_items = result.line_items.len(),
            issues = result.issues.len(),
            "Extraction complete"
        );

        Ok(result)
    }
}
