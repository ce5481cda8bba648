//! Extraction schema registry.
//!
//! A schema version is one immutable extraction contract: which fields the model
//! must read, which JSON keys it must emit them under, which rows of the G703
//! continuation sheet qualify, and which totals must reconcile. Versions are only
//! ever appended to the registry; results produced under an older version keep
//! their meaning forever.
//!
//! The row rules and arithmetic checks are plain data so that the instruction
//! builder (which tells the model about them) and the normalizer (which re-checks
//! them) read from the same source.

mod versions;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{GatewayError, GatewayResult};

/// Identifier of one supported extraction contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum SchemaVersion {
    /// G702 project info and summary totals plus the full G703 table.
    #[strum(serialize = "v1-full")]
    #[serde(rename = "v1-full")]
    V1Full,
    /// G703 only, with percent-complete fields.
    #[strum(serialize = "v2-g703")]
    #[serde(rename = "v2-g703")]
    V2G703,
    /// G703 rows billed this period, with keyword exclusions and a verification flag.
    #[strum(serialize = "v3-billable")]
    #[serde(rename = "v3-billable")]
    V3Billable,
}

impl SchemaVersion {
    /// The version used when a request does not name one.
    pub fn latest() -> Self {
        Self::iter().last().unwrap_or(Self::V3Billable)
    }

    /// Get the string identifier.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Semantic type of an extracted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    Date,
    Currency,
    Percent,
    Text,
    Boolean,
}

/// Top-level section of the model's JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    #[serde(rename = "projectInfo")]
    ProjectInfo,
    #[serde(rename = "g702Totals")]
    G702Totals,
    #[serde(rename = "lineItems")]
    LineItems,
}

impl Section {
    /// JSON key of the section in both the model output and the canonical result.
    pub fn key(&self) -> &'static str {
        match self {
            Section::ProjectInfo => "projectInfo",
            Section::G702Totals => "g702Totals",
            Section::LineItems => "lineItems",
        }
    }
}

/// Canonical project information fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectField {
    Name,
    PayAppDate,
    PeriodStart,
    PeriodEnd,
}

/// Canonical G702 summary total fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TotalsField {
    OriginalContractSum,
    ContractSumToDate,
    TotalCompletedToDate,
    CurrentPaymentDue,
}

/// Canonical line item fields (the superset across all versions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineField {
    BudgetCode,
    Description,
    ScheduledValue,
    WorkCompletedThisPeriod,
    TotalCompletedToDate,
    BalanceToFinish,
    PercentComplete,
    ValueRequested,
    NeedsVerification,
}

impl LineField {
    /// Canonical JSON name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            LineField::BudgetCode => "budgetCode",
            LineField::Description => "description",
            LineField::ScheduledValue => "scheduledValue",
            LineField::WorkCompletedThisPeriod => "workCompletedThisPeriod",
            LineField::TotalCompletedToDate => "totalCompletedToDate",
            LineField::BalanceToFinish => "balanceToFinish",
            LineField::PercentComplete => "percentComplete",
            LineField::ValueRequested => "valueRequested",
            LineField::NeedsVerification => "needsVerification",
        }
    }
}

/// The canonical field a [`FieldSpec`] fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Project(ProjectField),
    Totals(TotalsField),
    Line(LineField),
}

impl FieldTarget {
    /// Section the field belongs to.
    pub fn section(&self) -> Section {
        match self {
            FieldTarget::Project(_) => Section::ProjectInfo,
            FieldTarget::Totals(_) => Section::G702Totals,
            FieldTarget::Line(_) => Section::LineItems,
        }
    }
}

/// Contract for one expected output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key the model must emit.
    pub key: &'static str,
    /// Canonical field the value lands in.
    pub target: FieldTarget,
    /// Semantic type.
    pub kind: FieldKind,
    /// Whether absence is reported as an issue.
    pub required: bool,
    /// Where on the document the value is read from.
    pub source: &'static str,
}

impl FieldSpec {
    pub const fn required(
        key: &'static str,
        target: FieldTarget,
        kind: FieldKind,
        source: &'static str,
    ) -> Self {
        Self {
            key,
            target,
            kind,
            required: true,
            source,
        }
    }

    pub const fn optional(
        key: &'static str,
        target: FieldTarget,
        kind: FieldKind,
        source: &'static str,
    ) -> Self {
        Self {
            key,
            target,
            kind,
            required: false,
            source,
        }
    }

    pub fn section(&self) -> Section {
        self.target.section()
    }
}

/// Which rows of the continuation sheet qualify for extraction.
#[derive(Debug, Clone, Default)]
pub struct RowRules {
    /// Structural rows (totals, section headers) that are never line items.
    pub summary_rows: &'static [&'static str],
    /// Business exclusions matched against the row description.
    pub excluded_keywords: &'static [&'static str],
    /// Rows whose value in this field is not greater than zero are dropped.
    pub min_nonzero: Option<LineField>,
}

/// A derivable total that must reconcile with its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticCheck {
    /// Row-level: `target = minuend - subtrahend`.
    Difference {
        target: LineField,
        minuend: LineField,
        subtrahend: LineField,
    },
    /// Row-level: `target = numerator / denominator * 100`.
    Percentage {
        target: LineField,
        numerator: LineField,
        denominator: LineField,
    },
    /// Document-level: a G702 total equals the sum of a line item column.
    ColumnSum { total: TotalsField, column: LineField },
}

/// Why a row matched the exclusion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// A totals or header row.
    SummaryRow(&'static str),
    /// A non-billable keyword.
    ExcludedKeyword(&'static str),
}

impl ExclusionReason {
    pub fn keyword(&self) -> &'static str {
        match self {
            ExclusionReason::SummaryRow(k) | ExclusionReason::ExcludedKeyword(k) => k,
        }
    }
}

#[derive(Debug, Clone)]
struct KeywordMatcher {
    reason: ExclusionReason,
    pattern: Regex,
}

impl KeywordMatcher {
    fn new(reason: ExclusionReason) -> Self {
        let words: Vec<String> = reason
            .keyword()
            .split_whitespace()
            .map(regex::escape)
            .collect();
        let pattern = format!(r"(?i)\b{}(?:s|es)?\b", words.join(r"\s+"));
        Self {
            reason,
            pattern: Regex::new(&pattern).expect("escaped keyword is a valid pattern"),
        }
    }
}

/// One registered extraction contract.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub version: SchemaVersion,
    /// Short human-readable title.
    pub title: &'static str,
    /// Document orientation given to the model before the field mapping.
    pub preamble: &'static str,
    /// Field contracts, in output order.
    pub fields: Vec<FieldSpec>,
    pub rows: RowRules,
    pub checks: Vec<ArithmeticCheck>,
    matchers: Vec<KeywordMatcher>,
}

impl SchemaDefinition {
    pub fn new(
        version: SchemaVersion,
        title: &'static str,
        preamble: &'static str,
        fields: Vec<FieldSpec>,
        rows: RowRules,
        checks: Vec<ArithmeticCheck>,
    ) -> Self {
        let matchers = rows
            .summary_rows
            .iter()
            .map(|k| KeywordMatcher::new(ExclusionReason::SummaryRow(k)))
            .chain(
                rows.excluded_keywords
                    .iter()
                    .map(|k| KeywordMatcher::new(ExclusionReason::ExcludedKeyword(k))),
            )
            .collect();

        Self {
            version,
            title,
            preamble,
            fields,
            rows,
            checks,
            matchers,
        }
    }

    /// Fields of one section, in declaration order.
    pub fn section_fields(&self, section: Section) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.section() == section)
    }

    /// Repeated (one-per-row) fields.
    pub fn line_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.section_fields(Section::LineItems)
    }

    /// Scalar sections declared by this version, in output order.
    pub fn scalar_sections(&self) -> Vec<Section> {
        [Section::ProjectInfo, Section::G702Totals]
            .into_iter()
            .filter(|s| self.section_fields(*s).next().is_some())
            .collect()
    }

    /// Look up the spec filling a canonical line field.
    pub fn line_field(&self, field: LineField) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.target == FieldTarget::Line(field))
    }

    /// Check a row description against the exclusion rules.
    pub fn exclusion_for(&self, description: &str) -> Option<ExclusionReason> {
        self.matchers
            .iter()
            .find(|m| m.pattern.is_match(description))
            .map(|m| m.reason)
    }
}

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::builtin);

/// The set of supported extraction contracts.
#[derive(Debug)]
pub struct SchemaRegistry {
    definitions: Vec<SchemaDefinition>,
}

impl SchemaRegistry {
    /// The process-wide registry, built on first use.
    pub fn global() -> &'static SchemaRegistry {
        &REGISTRY
    }

    fn builtin() -> Self {
        Self {
            definitions: vec![versions::v1_full(), versions::v2_g703(), versions::v3_billable()],
        }
    }

    /// Get the definition of a version.
    pub fn get(&self, version: SchemaVersion) -> GatewayResult<&SchemaDefinition> {
        self.definitions
            .iter()
            .find(|d| d.version == version)
            .ok_or_else(|| GatewayError::unknown_schema(version.as_str()))
    }

    /// Resolve an optional selector string; `None`, empty and `latest` pick the newest version.
    pub fn resolve(&self, selector: Option<&str>) -> GatewayResult<&SchemaDefinition> {
        match selector.map(str::trim) {
            None | Some("") => self.get(SchemaVersion::latest()),
            Some(s) if s.eq_ignore_ascii_case("latest") => self.get(SchemaVersion::latest()),
            Some(s) => {
                let version: SchemaVersion =
                    s.parse().map_err(|_| GatewayError::unknown_schema(s))?;
                self.get(version)
            }
        }
    }

    /// All registered definitions, oldest first.
    pub fn definitions(&self) -> &[SchemaDefinition] {
        &self.definitions
    }

    /// All registered versions, oldest first.
    pub fn versions(&self) -> Vec<SchemaVersion> {
        self.definitions.iter().map(|d| d.version).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_every_version_is_registered() {
        let registry = SchemaRegistry::global();
        for version in SchemaVersion::iter() {
            assert_eq!(registry.get(version).unwrap().version, version);
        }
        assert_eq!(registry.versions().len(), SchemaVersion::iter().count());
    }

    #[test]
    fn test_resolve_defaults_to_latest() {
        let registry = SchemaRegistry::global();
        assert_eq!(registry.resolve(None).unwrap().version, SchemaVersion::V3Billable);
        assert_eq!(registry.resolve(Some("")).unwrap().version, SchemaVersion::V3Billable);
        assert_eq!(
            registry.resolve(Some("latest")).unwrap().version,
            SchemaVersion::V3Billable
        );
    }

    #[test]
    fn test_resolve_by_name() {
        let registry = SchemaRegistry::global();
        assert_eq!(registry.resolve(Some("v1-full")).unwrap().version, SchemaVersion::V1Full);
        assert_eq!(registry.resolve(Some("V2-G703")).unwrap().version, SchemaVersion::V2G703);
    }

    #[test]
    fn test_resolve_unknown_is_client_error() {
        let err = SchemaRegistry::global().resolve(Some("v9-future")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CliUnknownSchema);
    }

    #[test]
    fn test_version_string_forms() {
        assert_eq!(SchemaVersion::V3Billable.to_string(), "v3-billable");
        assert_eq!(SchemaVersion::V1Full.as_str(), "v1-full");
        assert_eq!(
            serde_json::to_string(&SchemaVersion::V2G703).unwrap(),
            "\"v2-g703\""
        );
    }

    #[test]
    fn test_every_version_requires_a_description() {
        for def in SchemaRegistry::global().definitions() {
            let spec = def.line_field(LineField::Description).unwrap();
            assert!(spec.required, "{} must require descriptions", def.version);
        }
    }

    #[test]
    fn test_keyword_matching_uses_word_boundaries() {
        let def = SchemaRegistry::global().get(SchemaVersion::V3Billable).unwrap();
        assert_eq!(
            def.exclusion_for("Payment & Performance Bond"),
            Some(ExclusionReason::ExcludedKeyword("BOND"))
        );
        assert_eq!(
            def.exclusion_for("general   conditions / supervision"),
            Some(ExclusionReason::ExcludedKeyword("GENERAL CONDITIONS"))
        );
        assert!(def.exclusion_for("Vagabond Mural").is_none());
        assert!(def.exclusion_for("Drywall - Level 3").is_none());
    }

    #[test]
    fn test_summary_rows_match() {
        let def = SchemaRegistry::global().get(SchemaVersion::V1Full).unwrap();
        assert!(matches!(
            def.exclusion_for("GRAND TOTALS:"),
            Some(ExclusionReason::SummaryRow(_))
        ));
        assert!(def.exclusion_for("Change Order #3 - Added outlets").is_none());
    }

    #[test]
    fn test_only_full_version_has_totals() {
        let registry = SchemaRegistry::global();
        assert_eq!(
            registry.get(SchemaVersion::V1Full).unwrap().scalar_sections(),
            vec![Section::ProjectInfo, Section::G702Totals]
        );
        assert_eq!(
            registry.get(SchemaVersion::V3Billable).unwrap().scalar_sections(),
            vec![Section::ProjectInfo]
        );
    }
}
