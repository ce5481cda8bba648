//! Schema introspection endpoints.

use axum::{extract::Path, Json};
use serde::Serialize;

use paygate_core::schema::{FieldKind, Section};
use paygate_core::{build_instructions, SchemaDefinition, SchemaRegistry, SchemaVersion};

use crate::error::ApiResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub version: SchemaVersion,
    pub title: &'static str,
    pub latest: bool,
    pub fields: Vec<FieldSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub section: Section,
    pub key: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SchemaListResponse {
    pub schemas: Vec<SchemaSummary>,
}

impl From<&SchemaDefinition> for SchemaSummary {
    fn from(def: &SchemaDefinition) -> Self {
        Self {
            version: def.version,
            title: def.title,
            latest: def.version == SchemaVersion::latest(),
            fields: def
                .fields
                .iter()
                .map(|f| FieldSummary {
                    section: f.section(),
                    key: f.key,
                    kind: f.kind,
                    required: f.required,
                    source: f.source,
                })
                .collect(),
        }
    }
}

/// List registered schema versions.
/// GET /schemas
pub async fn list_schemas() -> Json<SchemaListResponse> {
    let schemas = SchemaRegistry::global()
        .definitions()
        .iter()
        .map(SchemaSummary::from)
        .collect();
    Json(SchemaListResponse { schemas })
}

/// Exact instruction text sent to the model for a version.
/// GET /schemas/:version/instructions
pub async fn schema_instructions(Path(version): Path<String>) -> ApiResult<String> {
    let def = SchemaRegistry::global().resolve(Some(version.as_str()))?;
    Ok(build_instructions(def))
}
