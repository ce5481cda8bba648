//! Error types for paygate operations.
//!
//! Errors are grouped into the taxonomy the gateway reports to callers:
//! configuration problems (fatal at startup), client errors (the request must be
//! fixed), and upstream errors (the model or its transport misbehaved). Non-fatal
//! defects found while normalizing a model response are not errors at all; they
//! are recorded as [`Issue`](crate::types::Issue)s on the result.

use thiserror::Error;

/// Result type alias for paygate operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Maximum number of characters of provider diagnostics carried in an error message.
pub const MAX_EXCERPT_CHARS: usize = 200;

/// Main error type for all paygate operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration error (missing credential, invalid setting).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The caller's request is invalid.
    #[error("Client error: {message}")]
    Client { message: String, code: ErrorCode },

    /// The model or its transport failed.
    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        code: ErrorCode,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad error classification used for response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationError,
    ClientError,
    UpstreamError,
    InternalError,
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgInvalid,

    // Client (CLI_xxx)
    CliMissingDocument,
    CliInvalidDocument,
    CliUnsupportedFormat,
    CliUnknownSchema,
    CliInvalidRequest,

    // Upstream (UPS_xxx)
    UpsTransport,
    UpsTimeout,
    UpsProviderStatus,
    UpsEmptyResponse,
    UpsMalformedOutput,
    UpsUnreadableResponse,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::CliMissingDocument => "CLI_001",
            ErrorCode::CliInvalidDocument => "CLI_002",
            ErrorCode::CliUnsupportedFormat => "CLI_003",
            ErrorCode::CliUnknownSchema => "CLI_004",
            ErrorCode::CliInvalidRequest => "CLI_005",
            ErrorCode::UpsTransport => "UPS_001",
            ErrorCode::UpsTimeout => "UPS_002",
            ErrorCode::UpsProviderStatus => "UPS_003",
            ErrorCode::UpsEmptyResponse => "UPS_004",
            ErrorCode::UpsMalformedOutput => "UPS_005",
            ErrorCode::UpsUnreadableResponse => "UPS_006",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl GatewayError {
    /// Create a client error with an explicit code.
    pub fn client(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            code,
        }
    }

    /// Create an error for a request that carries no document.
    pub fn missing_document() -> Self {
        Self::client(ErrorCode::CliMissingDocument, "No document data provided")
    }

    /// Create an error for an unregistered schema version selector.
    pub fn unknown_schema(selector: impl AsRef<str>) -> Self {
        Self::client(
            ErrorCode::CliUnknownSchema,
            format!(
                "Unsupported schema version '{}'",
                sanitize_excerpt(selector.as_ref(), 64)
            ),
        )
    }

    /// Create an upstream error with an explicit code.
    pub fn upstream(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            code,
            status: None,
            source: None,
        }
    }

    /// Create a transport-level upstream error, keeping the underlying cause.
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Upstream {
            message: message.into(),
            code: ErrorCode::UpsTransport,
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create an error for a non-success provider status.
    ///
    /// The provider's own diagnostic text is sanitized and capped before it is
    /// carried in the message.
    pub fn provider_status(status: u16, provider_message: &str) -> Self {
        let excerpt = sanitize_excerpt(provider_message, MAX_EXCERPT_CHARS);
        let message = if excerpt.is_empty() {
            format!("Model provider returned status {}", status)
        } else {
            format!("Model provider returned status {}: {}", status, excerpt)
        };
        Self::Upstream {
            message,
            code: ErrorCode::UpsProviderStatus,
            status: Some(status),
            source: None,
        }
    }

    /// Create an error for model output that is not parseable JSON.
    pub fn malformed_output(message: impl Into<String>) -> Self {
        Self::upstream(ErrorCode::UpsMalformedOutput, message)
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::Client { code, .. } => *code,
            Self::Upstream { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Get the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::ConfigurationError,
            Self::Client { .. } => ErrorKind::ClientError,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            _ => ErrorKind::InternalError,
        }
    }

    /// Message safe to show to an API caller.
    ///
    /// Internal errors are replaced by a generic message.
    pub fn public_message(&self) -> String {
        match self {
            Self::Configuration(_) => "Gateway is not configured".to_string(),
            Self::Client { message, .. } | Self::Upstream { message, .. } => message.clone(),
            _ => "Internal error".to_string(),
        }
    }
}

/// Reduce untrusted text to a single printable line of at most `max_chars` characters.
pub fn sanitize_excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let mut truncated: String = collapsed.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
