//! Error handling for the HTTP gateway.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

use paygate_core::error::{sanitize_excerpt, ErrorCode, ErrorKind, GatewayError, MAX_EXCERPT_CHARS};

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        kind: ErrorKind,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::ClientError, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InternalError,
            ErrorCode::Internal,
            message,
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                kind: self.kind.into(),
                code: self.code.as_str(),
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

// Convert from paygate-core errors
impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = match (err.kind(), err.code()) {
            (ErrorKind::ClientError, _) => StatusCode::BAD_REQUEST,
            (ErrorKind::UpstreamError, ErrorCode::UpsTimeout) => StatusCode::GATEWAY_TIMEOUT,
            (ErrorKind::UpstreamError, _) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match err.kind() {
            ErrorKind::ClientError => warn!(code = err.code().as_str(), "Rejected request: {}", err),
            _ => error!(code = err.code().as_str(), error = ?err, "Extraction failed: {}", err),
        }

        Self::new(status, err.kind(), err.code(), err.public_message())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        let status = if status.is_client_error() {
            status
        } else {
            StatusCode::BAD_REQUEST
        };
        let message = sanitize_excerpt(&rejection.body_text(), MAX_EXCERPT_CHARS);
        warn!(status = status.as_u16(), "Invalid request body: {}", message);

        Self::new(
            status,
            ErrorKind::ClientError,
            ErrorCode::CliInvalidRequest,
            message,
        )
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
