//! Core types for paygate.

mod document;
mod result;

pub use document::{Document, DocumentKind, ExtractionRequest};
pub use result::{
    ExtractionResult, ExtractionStatus, G702Totals, Issue, IssueKind, LineItem, ProjectInfo,
};
