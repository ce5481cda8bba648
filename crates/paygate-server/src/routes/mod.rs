//! Route definitions for the HTTP gateway.

mod extract;
mod health;
mod schemas;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Extraction
        .route("/extract", post(extract::extract_document))
        .route("/api/extract-pdf", post(extract::extract_document))
        // Schema introspection
        .route("/schemas", get(schemas::list_schemas))
        .route("/schemas/:version/instructions", get(schemas::schema_instructions))
        // Attach state
        .with_state(state)
}

pub use extract::*;
pub use health::*;
pub use schemas::*;
