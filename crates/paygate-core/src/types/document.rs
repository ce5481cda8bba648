//! Inbound documents and extraction requests.

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

use crate::error::{ErrorCode, GatewayError, GatewayResult};
use crate::schema::{SchemaRegistry, SchemaVersion};

/// Document formats the model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
}

impl DocumentKind {
    /// Detect the format from magic numbers.
    pub fn detect(content: &[u8]) -> Option<Self> {
        if content.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else if content.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(Self::Png)
        } else if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    /// MIME type sent to the model.
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Whether the model receives this as an image rather than a document block.
    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// A non-empty document of a supported format.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    kind: DocumentKind,
}

impl Document {
    /// Wrap raw bytes, rejecting empty or unrecognized content.
    pub fn from_bytes(bytes: Vec<u8>) -> GatewayResult<Self> {
        if bytes.is_empty() {
            return Err(GatewayError::missing_document());
        }
        let kind = DocumentKind::detect(&bytes).ok_or_else(|| {
            GatewayError::client(
                ErrorCode::CliUnsupportedFormat,
                "Document is not a PDF, PNG, or JPEG file",
            )
        })?;
        Ok(Self { bytes, kind })
    }

    /// Decode base64 transport encoding, with or without a `data:` URL prefix.
    pub fn from_base64(data: &str) -> GatewayResult<Self> {
        let data = data.trim();
        let payload = match data.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(";base64,")
                .map(|(_, payload)| payload)
                .ok_or_else(|| {
                    GatewayError::client(
                        ErrorCode::CliInvalidDocument,
                        "Document data URL is not base64 encoded",
                    )
                })?,
            None => data,
        };

        if payload.is_empty() {
            return Err(GatewayError::missing_document());
        }

        let compact: String = payload.split_whitespace().collect();
        let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| {
            GatewayError::client(
                ErrorCode::CliInvalidDocument,
                format!("Document is not valid base64: {}", e),
            )
        })?;

        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 encoding for the model request.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// SHA-256 of the content, for logs that must not carry the document itself.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// A document paired with the contract to extract it under.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub document: Document,
    pub schema: SchemaVersion,
}

impl ExtractionRequest {
    pub fn new(document: Document, schema: SchemaVersion) -> Self {
        Self { document, schema }
    }

    /// Build a request from transport fields.
    ///
    /// The document is checked before the schema selector, so a request missing
    /// both reports the missing document.
    pub fn from_base64(document: Option<&str>, schema: Option<&str>) -> GatewayResult<Self> {
        let document = match document {
            Some(data) => Document::from_base64(data)?,
            None => return Err(GatewayError::missing_document()),
        };
        let schema = SchemaRegistry::global().resolve(schema)?.version;
        Ok(Self::new(document, schema))
    }
}
