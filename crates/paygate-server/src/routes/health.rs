//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use paygate_core::SchemaVersion;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub latest_schema: SchemaVersion,
    pub default_schema: SchemaVersion,
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.pipeline.model_name().to_string(),
        latest_schema: SchemaVersion::latest(),
        default_schema: state.default_schema,
    })
}
