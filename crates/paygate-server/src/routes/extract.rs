//! Extraction endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use tracing::debug;

use paygate_core::{ExtractionRequest, ExtractionResult};

use crate::error::ApiResult;
use crate::state::AppState;

/// Request body for extracting a pay application.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Base64 document, optionally as a `data:` URL.
    #[serde(default, alias = "base64Data")]
    pub document: Option<String>,
    /// Schema version selector; the server default when absent.
    #[serde(default)]
    pub schema_version: Option<String>,
}

/// Extract a pay application.
/// POST /extract (also POST /api/extract-pdf)
pub async fn extract_document(
    State(state): State<AppState>,
    body: Result<Json<ExtractRequest>, JsonRejection>,
) -> ApiResult<Json<ExtractionResult>> {
    let Json(body) = body?;

    let schema = body
        .schema_version
        .as_deref()
        .unwrap_or(state.default_schema.as_str());
    let request = ExtractionRequest::from_base64(body.document.as_deref(), Some(schema))?;

    debug!(schema = %request.schema, bytes = request.document.len(), "Accepted extraction request");

    let result = state.pipeline.run(&request).await?;
    Ok(Json(result))
}
