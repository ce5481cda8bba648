//! paygate-server - HTTP extraction gateway for paygate.
//!
//! Exposes `POST /extract`, which takes a base64 pay application and a schema
//! version and returns the canonical extraction result, plus health and schema
//! introspection routes.
//!
//! # Example
//!
//! ```ignore
//! use paygate_server::{create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::new(model, SchemaVersion::latest());
//!     let app = create_server(state, 32 * 1024 * 1024);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState, body_limit_bytes: usize) -> Router {
    routes::create_router(state)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
