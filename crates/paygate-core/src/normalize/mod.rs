//! Response validation and normalization.
//!
//! Turns the model's free-form text into an [`ExtractionResult`] under one schema
//! version. The model's output is never trusted: every field is re-typed, every
//! row is re-checked against the version's row rules, and derivable totals are
//! reconciled. Problems are recorded as [`Issue`]s and never abort the pass,
//! except when no JSON object can be found at all.

mod coerce;
pub mod json_parser;

pub use coerce::{parse_currency, parse_date, parse_percent};

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::{
    ArithmeticCheck, ExclusionReason, FieldSpec, FieldTarget, LineField, ProjectField,
    SchemaDefinition, Section, TotalsField,
};
use crate::traits::RawModelResponse;
use crate::types::{
    ExtractionResult, ExtractionStatus, G702Totals, Issue, IssueKind, LineItem, ProjectInfo,
};
use coerce::{coerce, Coerced, Coercion};

/// Allowed drift between a stated amount and the amount derived from its components.
pub const CURRENCY_TOLERANCE: Decimal = Decimal::ONE;

/// Allowed drift, in percentage points, for derived percentages.
pub const PERCENT_TOLERANCE: Decimal = Decimal::ONE;

/// Normalize a model response under a schema version.
pub fn normalize(raw: &RawModelResponse, schema: &SchemaDefinition) -> ExtractionResult {
    let mut result = normalize_text(&raw.text, schema);

    if raw.is_truncated() {
        if let Some(issue) = result
            .issues
            .iter_mut()
            .find(|i| i.kind == IssueKind::MalformedJson)
        {
            issue.message = format!("{} (model output hit the token limit)", issue.message);
        }
    }

    result
}

/// Normalize raw model text under a schema version.
pub fn normalize_text(text: &str, schema: &SchemaDefinition) -> ExtractionResult {
    let root = match json_parser::parse_object(text) {
        Ok(root) => root,
        Err(reason) => {
            debug!(schema = %schema.version, reason = %reason, "Model output is not JSON");
            return ExtractionResult::rejected(
                schema.version,
                Issue::new(IssueKind::MalformedJson, reason),
            );
        }
    };

    let mut normalizer = Normalizer::new(schema);
    normalizer.read_scalars(&root);
    normalizer.read_line_items(&root);
    normalizer.check_arithmetic();
    normalizer.finish()
}

struct Normalizer<'a> {
    schema: &'a SchemaDefinition,
    project: ProjectInfo,
    totals: Option<G702Totals>,
    /// Surviving rows with their index in the model's array.
    rows: Vec<(usize, LineItem)>,
    issues: Vec<Issue>,
    required_scalars: usize,
    required_scalars_unavailable: usize,
}

impl<'a> Normalizer<'a> {
    fn new(schema: &'a SchemaDefinition) -> Self {
        let totals = schema
            .scalar_sections()
            .contains(&Section::G702Totals)
            .then(G702Totals::default);

        Self {
            schema,
            project: ProjectInfo::default(),
            totals,
            rows: Vec::new(),
            issues: Vec::new(),
            required_scalars: 0,
            required_scalars_unavailable: 0,
        }
    }

    fn read_scalars(&mut self, root: &Map<String, Value>) {
        let schema = self.schema;
        for section in schema.scalar_sections() {
            let object = match root.get(section.key()) {
                Some(Value::Object(map)) => Some(map),
                None | Some(Value::Null) => None,
                Some(_) => {
                    self.issues.push(
                        Issue::new(
                            IssueKind::TypeCoercionFailed,
                            format!("'{}' is not an object", section.key()),
                        )
                        .with_field(section.key()),
                    );
                    let required = schema.section_fields(section).filter(|f| f.required).count();
                    self.required_scalars += required;
                    self.required_scalars_unavailable += required;
                    continue;
                }
            };

            for spec in schema.section_fields(section) {
                if spec.required {
                    self.required_scalars += 1;
                }
                let path = format!("{}.{}", section.key(), spec.key);
                match coerce(object.and_then(|o| o.get(spec.key)), spec.kind) {
                    Coercion::Absent => {
                        if spec.required {
                            self.required_scalars_unavailable += 1;
                            self.issues.push(
                                Issue::new(
                                    IssueKind::MissingRequiredField,
                                    format!("Required field '{}' is missing", path),
                                )
                                .with_field(path),
                            );
                        }
                    }
                    Coercion::Failed(reason) => {
                        if spec.required {
                            self.required_scalars_unavailable += 1;
                        }
                        self.issues.push(
                            Issue::new(
                                IssueKind::TypeCoercionFailed,
                                format!("Field '{}' could not be read as {}: {}", path, spec.kind, reason),
                            )
                            .with_field(path),
                        );
                    }
                    Coercion::Value(value) => self.assign_scalar(spec, value),
                }
            }
        }
    }

    fn assign_scalar(&mut self, spec: &FieldSpec, value: Coerced) {
        match (spec.target, value) {
            (FieldTarget::Project(ProjectField::Name), Coerced::Text(name)) => {
                self.project.name = Some(name)
            }
            (FieldTarget::Project(ProjectField::PayAppDate), Coerced::Date(d)) => {
                self.project.pay_app_date = Some(d)
            }
            (FieldTarget::Project(ProjectField::PeriodStart), Coerced::Date(d)) => {
                self.project.period_start = Some(d)
            }
            (FieldTarget::Project(ProjectField::PeriodEnd), Coerced::Date(d)) => {
                self.project.period_end = Some(d)
            }
            (FieldTarget::Totals(field), Coerced::Number(n)) => {
                self.totals.get_or_insert_with(G702Totals::default).set(field, n)
            }
            (target, value) => {
                debug!(?target, ?value, "Field spec kind does not match its canonical target");
            }
        }
    }

    fn read_line_items(&mut self, root: &Map<String, Value>) {
        let rows = match root.get(Section::LineItems.key()) {
            Some(Value::Array(rows)) => rows,
            None | Some(Value::Null) => {
                self.issues.push(
                    Issue::new(IssueKind::MissingRequiredField, "Required field 'lineItems' is missing")
                        .with_field(Section::LineItems.key()),
                );
                return;
            }
            Some(_) => {
                self.issues.push(
                    Issue::new(IssueKind::TypeCoercionFailed, "'lineItems' is not an array")
                        .with_field(Section::LineItems.key()),
                );
                return;
            }
        };

        for (index, row) in rows.iter().enumerate() {
            match row {
                Value::Object(fields) => {
                    if let Some(item) = self.read_row(index, fields) {
                        self.rows.push((index, item));
                    }
                }
                _ => self.issues.push(
                    Issue::new(
                        IssueKind::TypeCoercionFailed,
                        format!("Line item {} is not an object", index),
                    )
                    .with_row(index),
                ),
            }
        }
    }

    /// Read one row; `None` when the row is dropped.
    fn read_row(&mut self, index: usize, fields: &Map<String, Value>) -> Option<LineItem> {
        let schema = self.schema;
        let description = self.read_description(index, fields)?;

        if let Some(reason) = schema.exclusion_for(&description) {
            let billed = self.billed_this_period(fields);
            self.issues.push(excluded_row_issue(index, &description, reason, billed));
            return None;
        }

        let mut item = LineItem::new(description);
        for spec in schema.line_fields() {
            if spec.target == FieldTarget::Line(LineField::Description) {
                continue;
            }
            match coerce(fields.get(spec.key), spec.kind) {
                Coercion::Absent => {
                    if spec.required {
                        self.issues.push(
                            Issue::new(
                                IssueKind::MissingRequiredField,
                                format!("Line item {} is missing required field '{}'", index, spec.key),
                            )
                            .with_field(spec.key)
                            .with_row(index),
                        );
                    }
                }
                Coercion::Failed(reason) => self.issues.push(
                    Issue::new(
                        IssueKind::TypeCoercionFailed,
                        format!(
                            "Line item {} field '{}' could not be read as {}: {}",
                            index, spec.key, spec.kind, reason
                        ),
                    )
                    .with_field(spec.key)
                    .with_row(index),
                ),
                Coercion::Value(value) => assign_line(&mut item, spec, value),
            }
        }

        if let Some(field) = schema.rows.min_nonzero {
            if let Some(amount) = item.amount(field).filter(|a| *a <= Decimal::ZERO) {
                let key = self.wire_key(field);
                self.issues.push(
                    Issue::new(
                        IssueKind::ExcludedRowAmbiguous,
                        format!(
                            "Line item {} ('{}') has {} of {} and was dropped; only rows with a positive amount qualify",
                            index, item.description, key, amount
                        ),
                    )
                    .with_field(key)
                    .with_row(index),
                );
                return None;
            }
        }

        Some(item)
    }

    fn read_description(&mut self, index: usize, fields: &Map<String, Value>) -> Option<String> {
        let schema = self.schema;
        let spec = schema.line_field(LineField::Description)?;
        match coerce(fields.get(spec.key), spec.kind) {
            Coercion::Value(Coerced::Text(text)) => Some(text),
            Coercion::Failed(reason) => {
                self.issues.push(
                    Issue::new(
                        IssueKind::TypeCoercionFailed,
                        format!("Line item {} description could not be read: {}; row dropped", index, reason),
                    )
                    .with_field(spec.key)
                    .with_row(index),
                );
                None
            }
            _ => {
                self.issues.push(
                    Issue::new(
                        IssueKind::MissingRequiredField,
                        format!("Line item {} has no description; row dropped", index),
                    )
                    .with_field(spec.key)
                    .with_row(index),
                );
                None
            }
        }
    }

    /// Amount billed this period on a raw row, read without recording issues.
    fn billed_this_period(&self, fields: &Map<String, Value>) -> Option<Decimal> {
        let spec = self.schema.line_field(LineField::WorkCompletedThisPeriod)?;
        match coerce(fields.get(spec.key), spec.kind) {
            Coercion::Value(Coerced::Number(n)) => Some(n),
            _ => None,
        }
    }

    fn wire_key(&self, field: LineField) -> &'static str {
        self.schema
            .line_field(field)
            .map(|s| s.key)
            .unwrap_or_else(|| field.name())
    }

    fn check_arithmetic(&mut self) {
        let schema = self.schema;
        for check in &schema.checks {
            match *check {
                ArithmeticCheck::Difference {
                    target,
                    minuend,
                    subtrahend,
                } => {
                    for i in 0..self.rows.len() {
                        let (index, item) = &self.rows[i];
                        let (Some(stated), Some(a), Some(b)) =
                            (item.amount(target), item.amount(minuend), item.amount(subtrahend))
                        else {
                            continue;
                        };
                        let expected = a.checked_sub(b);
                        if !within(stated, expected, CURRENCY_TOLERANCE) {
                            let issue = Issue::new(
                                IssueKind::ArithmeticInconsistent,
                                format!(
                                    "Line item {}: {} is {} but {} - {} = {}",
                                    index,
                                    self.wire_key(target),
                                    stated,
                                    self.wire_key(minuend),
                                    self.wire_key(subtrahend),
                                    describe(expected)
                                ),
                            )
                            .with_field(self.wire_key(target))
                            .with_row(*index);
                            self.issues.push(issue);
                        }
                    }
                }
                ArithmeticCheck::Percentage {
                    target,
                    numerator,
                    denominator,
                } => {
                    for i in 0..self.rows.len() {
                        let (index, item) = &self.rows[i];
                        let (Some(stated), Some(num), Some(den)) =
                            (item.amount(target), item.amount(numerator), item.amount(denominator))
                        else {
                            continue;
                        };
                        if den.is_zero() {
                            continue;
                        }
                        let expected = num
                            .checked_div(den)
                            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                            .map(|pct| pct.round_dp(2));
                        if !within(stated, expected, PERCENT_TOLERANCE) {
                            let issue = Issue::new(
                                IssueKind::ArithmeticInconsistent,
                                format!(
                                    "Line item {}: {} is {} but {} / {} is {}%",
                                    index,
                                    self.wire_key(target),
                                    stated,
                                    self.wire_key(numerator),
                                    self.wire_key(denominator),
                                    describe(expected)
                                ),
                            )
                            .with_field(self.wire_key(target))
                            .with_row(*index);
                            self.issues.push(issue);
                        }
                    }
                }
                ArithmeticCheck::ColumnSum { total, column } => {
                    let Some(stated) = self.totals.as_ref().and_then(|t| t.get(total)) else {
                        continue;
                    };
                    if self.rows.is_empty() {
                        continue;
                    }
                    let column_values: Option<Vec<Decimal>> =
                        self.rows.iter().map(|(_, item)| item.amount(column)).collect();
                    let Some(values) = column_values else {
                        continue;
                    };
                    let sum = values
                        .iter()
                        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(*value));
                    if !within(stated, sum, CURRENCY_TOLERANCE) {
                        let field = format!("{}.{}", Section::G702Totals.key(), total_key(self.schema, total));
                        self.issues.push(
                            Issue::new(
                                IssueKind::ArithmeticInconsistent,
                                format!(
                                    "'{}' is {} but the line items' {} sum to {}",
                                    field,
                                    stated,
                                    self.wire_key(column),
                                    describe(sum)
                                ),
                            )
                            .with_field(field),
                        );
                    }
                }
            }
        }
    }

    fn finish(self) -> ExtractionResult {
        let all_required_missing = self.required_scalars > 0
            && self.required_scalars_unavailable == self.required_scalars;

        let status = if all_required_missing || (!self.issues.is_empty() && self.rows.is_empty()) {
            ExtractionStatus::Rejected
        } else if self.issues.is_empty() {
            ExtractionStatus::Ok
        } else {
            ExtractionStatus::Partial
        };

        debug!(
            schema = %self.schema.version,
            status = %status,
            line_items = self.rows.len(),
            issues = self.issues.len(),
            "Normalized model output"
        );

        ExtractionResult {
            schema_version: self.schema.version,
            status,
            project_info: self.project,
            g702_totals: self.totals,
            line_items: self.rows.into_iter().map(|(_, item)| item).collect(),
            issues: self.issues,
        }
    }
}

/// Whether `stated` is within `tolerance` of `expected`. An expected value
/// that overflowed never matches.
fn within(stated: Decimal, expected: Option<Decimal>, tolerance: Decimal) -> bool {
    expected
        .and_then(|e| stated.checked_sub(e))
        .is_some_and(|diff| diff.abs() <= tolerance)
}

fn describe(value: Option<Decimal>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "out of range".to_string())
}

fn total_key(schema: &SchemaDefinition, total: TotalsField) -> &'static str {
    schema
        .fields
        .iter()
        .find(|f| f.target == FieldTarget::Totals(total))
        .map(|f| f.key)
        .unwrap_or("total")
}

fn assign_line(item: &mut LineItem, spec: &FieldSpec, value: Coerced) {
    let FieldTarget::Line(field) = spec.target else {
        return;
    };
    match (field, value) {
        (LineField::BudgetCode, Coerced::Text(code)) => item.budget_code = Some(code),
        (LineField::NeedsVerification, Coerced::Flag(flag)) => item.needs_verification = Some(flag),
        (field, Coerced::Number(n)) => {
            item.set_amount(field, n);
        }
        (field, value) => {
            debug!(?field, ?value, "Field spec kind does not match its canonical target");
        }
    }
}

fn excluded_row_issue(
    index: usize,
    description: &str,
    reason: ExclusionReason,
    billed: Option<Decimal>,
) -> Issue {
    let mut message = match reason {
        ExclusionReason::SummaryRow(keyword) => format!(
            "Line item {} ('{}') is a summary row (matched '{}') and was dropped",
            index, description, keyword
        ),
        ExclusionReason::ExcludedKeyword(keyword) => format!(
            "Line item {} ('{}') matches excluded keyword '{}' and was dropped",
            index, description, keyword
        ),
    };
    if let Some(amount) = billed.filter(|a| !a.is_zero()) {
        message.push_str(&format!("; it reported {} billed this period", amount));
    }
    Issue::new(IssueKind::ExcludedRowAmbiguous, message).with_row(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaRegistry, SchemaVersion};
    use std::str::FromStr;

    fn schema(version: SchemaVersion) -> &'static SchemaDefinition {
        SchemaRegistry::global().get(version).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const V1_CONFORMING: &str = r#"{
        "projectInfo": {
            "name": "Riverside Medical Office",
            "payAppDate": "2025-04-05",
            "periodStart": "2025-03-01",
            "periodEnd": "2025-03-31"
        },
        "g702Totals": {
            "originalContractSum": 250000,
            "contractSumToDate": 255000,
            "totalCompletedToDate": 60000,
            "currentPaymentDue": 18000
        },
        "lineItems": [
            {
                "budgetCode": "03-300.O",
                "description": "Cast-in-Place Concrete",
                "scheduledValue": 100000,
                "workCompleted": 15000,
                "totalCompletedToDate": 40000,
                "balanceToFinish": 60000,
                "percentComplete": 40
            },
            {
                "budgetCode": "09-250.O",
                "description": "Gypsum Board",
                "scheduledValue": 155000,
                "workCompleted": 5000,
                "totalCompletedToDate": 20000,
                "balanceToFinish": 135000,
                "percentComplete": 12.9
            },
            {
                "description": "GRAND TOTALS:",
                "scheduledValue": 255000,
                "totalCompletedToDate": 60000
            }
        ]
    }"#;

    #[test]
    fn test_conforming_v1_is_ok_except_summary_row() {
        let result = normalize_text(V1_CONFORMING, schema(SchemaVersion::V1Full));

        assert_eq!(result.line_items.len(), 2);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::ExcludedRowAmbiguous);
        assert_eq!(result.issues[0].row, Some(2));
        assert_eq!(result.status, ExtractionStatus::Partial);

        let totals = result.g702_totals.unwrap();
        assert_eq!(totals.total_completed_to_date, Some(dec("60000")));
        assert_eq!(result.line_items[0].work_completed_this_period, Some(dec("15000")));
    }

    #[test]
    fn test_v2_conforming_is_ok() {
        let text = r#"{
            "projectInfo": {"name": "Tower B", "periodStart": "03/01/2025", "periodEnd": "03/31/2025"},
            "lineItems": [
                {"description": "Electrical", "scheduledValue": "$80,000.00",
                 "workCompletedThisPeriod": "8,000.00", "totalCompletedToDate": "20,000.00",
                 "percentComplete": "25%", "balanceToFinish": "60,000.00"}
            ]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V2G703));

        assert!(result.is_ok(), "unexpected issues: {:?}", result.issues);
        let item = &result.line_items[0];
        assert_eq!(item.scheduled_value, Some(dec("80000")));
        assert_eq!(item.percent_complete, Some(dec("25")));
        assert_eq!(item.value_requested, None);
        assert_eq!(
            result.project_info.period_end,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 31)
        );
    }

    #[test]
    fn test_missing_required_scalar() {
        let text = r#"{
            "projectInfo": {"periodStart": "2025-03-01", "periodEnd": "2025-03-31"},
            "g702Totals": {},
            "lineItems": [{"description": "Sitework", "scheduledValue": 1000}]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V1Full));

        let missing: Vec<_> = result.issues_of(IssueKind::MissingRequiredField).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field.as_deref(), Some("projectInfo.name"));
        assert_eq!(result.project_info.name, None);
        assert_eq!(result.status, ExtractionStatus::Partial);
    }

    #[test]
    fn test_all_required_scalars_missing_is_rejected() {
        let text = r#"{"lineItems": [{"description": "Sitework", "scheduledValue": 1000}]}"#;
        let result = normalize_text(text, schema(SchemaVersion::V1Full));

        assert_eq!(result.status, ExtractionStatus::Rejected);
        assert_eq!(result.issues_of(IssueKind::MissingRequiredField).count(), 3);
        assert_eq!(result.line_items.len(), 1);
    }

    #[test]
    fn test_coercion_failure_leaves_field_unset() {
        let text = r#"{
            "projectInfo": {"name": "Annex", "payAppDate": "sometime in April"},
            "lineItems": [{"description": "Paint", "workCompletedThisPeriod": "about 5k"}]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V3Billable));

        assert_eq!(result.project_info.pay_app_date, None);
        let failed: Vec<_> = result.issues_of(IssueKind::TypeCoercionFailed).collect();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[1].row, Some(0));
        assert_eq!(failed[1].field.as_deref(), Some("workCompletedThisPeriod"));
        assert_eq!(result.line_items[0].work_completed_this_period, None);
        assert_eq!(result.status, ExtractionStatus::Partial);
    }

    #[test]
    fn test_excluded_keyword_overrides_model() {
        let text = r#"{
            "projectInfo": {"name": "Annex"},
            "lineItems": [
                {"description": "Performance BOND", "workCompletedThisPeriod": 2400, "needsVerification": false},
                {"description": "Framing", "workCompletedThisPeriod": 9000}
            ]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V3Billable));

        assert_eq!(result.line_items.len(), 1);
        assert_eq!(result.line_items[0].description, "Framing");
        let excluded: Vec<_> = result.issues_of(IssueKind::ExcludedRowAmbiguous).collect();
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].row, Some(0));
        assert!(excluded[0].message.contains("BOND"));
        assert!(excluded[0].message.contains("2400"));
    }

    #[test]
    fn test_zero_this_period_row_dropped() {
        let text = r#"{
            "projectInfo": {"name": "Annex"},
            "lineItems": [
                {"description": "Masonry", "workCompletedThisPeriod": "0.00"},
                {"description": "Framing", "workCompletedThisPeriod": 9000}
            ]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V3Billable));

        assert_eq!(result.line_items.len(), 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::ExcludedRowAmbiguous);
        assert_eq!(result.issues[0].field.as_deref(), Some("workCompletedThisPeriod"));
    }

    #[test]
    fn test_row_without_description_dropped() {
        let text = r#"{
            "projectInfo": {"name": "Annex"},
            "lineItems": [{"workCompletedThisPeriod": 100}, "oops", {"description": "Doors", "workCompletedThisPeriod": 100}]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V3Billable));

        assert_eq!(result.line_items.len(), 1);
        assert_eq!(result.issues_of(IssueKind::MissingRequiredField).count(), 1);
        assert_eq!(result.issues_of(IssueKind::TypeCoercionFailed).count(), 1);
        assert_eq!(result.status, ExtractionStatus::Partial);
    }

    #[test]
    fn test_arithmetic_inconsistency_is_non_blocking() {
        let text = r#"{
            "projectInfo": {"name": "Tower B"},
            "lineItems": [
                {"description": "Roofing", "scheduledValue": 50000, "totalCompletedToDate": 20000,
                 "balanceToFinish": 25000, "percentComplete": 40}
            ]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V2G703));

        let arithmetic: Vec<_> = result.issues_of(IssueKind::ArithmeticInconsistent).collect();
        assert_eq!(arithmetic.len(), 1);
        assert_eq!(arithmetic[0].field.as_deref(), Some("balanceToFinish"));
        assert_eq!(result.line_items[0].balance_to_finish, Some(dec("25000")));
        assert_eq!(result.status, ExtractionStatus::Partial);
    }

    #[test]
    fn test_rounding_within_tolerance() {
        let text = r#"{
            "projectInfo": {"name": "Tower B"},
            "lineItems": [
                {"description": "Glazing", "scheduledValue": 30000, "totalCompletedToDate": 10000,
                 "balanceToFinish": 20000.40, "percentComplete": 33.3}
            ]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V2G703));
        assert!(result.is_ok(), "unexpected issues: {:?}", result.issues);
    }

    #[test]
    fn test_g702_total_must_match_column_sum() {
        // First occurrence is the G702 total
        let text = V1_CONFORMING.replacen(
            "\"totalCompletedToDate\": 60000",
            "\"totalCompletedToDate\": 75000",
            1,
        );
        let result = normalize_text(&text, schema(SchemaVersion::V1Full));

        let arithmetic: Vec<_> = result.issues_of(IssueKind::ArithmeticInconsistent).collect();
        assert_eq!(arithmetic.len(), 1);
        assert_eq!(arithmetic[0].field.as_deref(), Some("g702Totals.totalCompletedToDate"));
        assert_eq!(arithmetic[0].row, None);
    }

    #[test]
    fn test_out_of_range_amounts_are_reported_not_computed() {
        let text = r#"{
            "projectInfo": {"name": "Tower B"},
            "lineItems": [
                {"description": "Steel", "scheduledValue": "0.0000001",
                 "totalCompletedToDate": "70000000000000000000000000000",
                 "percentComplete": 50, "balanceToFinish": 0},
                {"description": "Piling", "scheduledValue": "70000000000000000000000000000",
                 "totalCompletedToDate": "-70000000000000000000000000000",
                 "percentComplete": 0, "balanceToFinish": 0}
            ]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V2G703));

        assert_eq!(result.line_items.len(), 2);
        assert_eq!(result.status, ExtractionStatus::Partial);
        let out_of_range = |row: usize, field: &str| {
            result.issues_of(IssueKind::ArithmeticInconsistent).any(|i| {
                i.row == Some(row)
                    && i.field.as_deref() == Some(field)
                    && i.message.contains("out of range")
            })
        };
        assert!(out_of_range(0, "percentComplete"), "issues: {:?}", result.issues);
        assert!(out_of_range(1, "balanceToFinish"), "issues: {:?}", result.issues);
    }

    #[test]
    fn test_column_sum_overflow_is_reported() {
        let text = r#"{
            "projectInfo": {"name": "Tower B", "periodStart": "2025-03-01", "periodEnd": "2025-03-31"},
            "g702Totals": {"totalCompletedToDate": 1},
            "lineItems": [
                {"description": "Steel", "scheduledValue": 1, "totalCompletedToDate": "70000000000000000000000000000"},
                {"description": "Piling", "scheduledValue": 1, "totalCompletedToDate": "70000000000000000000000000000"}
            ]
        }"#;
        let result = normalize_text(text, schema(SchemaVersion::V1Full));

        let arithmetic: Vec<_> = result.issues_of(IssueKind::ArithmeticInconsistent).collect();
        assert_eq!(arithmetic.len(), 1);
        assert_eq!(arithmetic[0].field.as_deref(), Some("g702Totals.totalCompletedToDate"));
        assert!(arithmetic[0].message.contains("out of range"));
    }

    #[test]
    fn test_v3_accepts_line_items_without_project_info() {
        let text = r#"{"lineItems": [
            {"description": "Drywall - Level 3", "workCompletedThisPeriod": "12500.00", "valueRequested": "48000.00"},
            {"description": "General Conditions / Supervision", "workCompletedThisPeriod": "500.00", "valueRequested": "500.00"}
        ]}"#;
        let result = normalize_text(text, schema(SchemaVersion::V3Billable));

        assert_eq!(result.line_items.len(), 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::ExcludedRowAmbiguous);
        assert_eq!(result.status, ExtractionStatus::Partial);
    }

    #[test]
    fn test_missing_line_items_array() {
        let result = normalize_text(r#"{"projectInfo": {"name": "Annex"}}"#, schema(SchemaVersion::V3Billable));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].field.as_deref(), Some("lineItems"));
        assert_eq!(result.status, ExtractionStatus::Rejected);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = normalize_text("The document could not be processed.", schema(SchemaVersion::V2G703));
        assert_eq!(result.status, ExtractionStatus::Rejected);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::MalformedJson);
        assert!(result.line_items.is_empty());
    }

    #[test]
    fn test_truncation_noted_on_malformed_output() {
        let raw = RawModelResponse {
            text: r#"{"lineItems": [{"description": "Conc"#.to_string(),
            stop_reason: Some("max_tokens".to_string()),
            ..RawModelResponse::from_text("")
        };
        let result = normalize(&raw, schema(SchemaVersion::V3Billable));
        assert!(result.issues[0].message.contains("token limit"));
    }
}
