//! Canonical extraction result types.
//!
//! Every schema version normalizes into these records. A field the version does
//! not produce, or whose value could not be coerced, stays `None`; it is never
//! defaulted to zero or an empty string.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::schema::{LineField, SchemaVersion, TotalsField};

/// Project information from the pay application header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: Option<String>,
    pub pay_app_date: Option<NaiveDate>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// G702 summary totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct G702Totals {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub original_contract_sum: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub contract_sum_to_date: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_completed_to_date: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub current_payment_due: Option<Decimal>,
}

impl G702Totals {
    pub fn get(&self, field: TotalsField) -> Option<Decimal> {
        match field {
            TotalsField::OriginalContractSum => self.original_contract_sum,
            TotalsField::ContractSumToDate => self.contract_sum_to_date,
            TotalsField::TotalCompletedToDate => self.total_completed_to_date,
            TotalsField::CurrentPaymentDue => self.current_payment_due,
        }
    }

    pub fn set(&mut self, field: TotalsField, value: Decimal) {
        match field {
            TotalsField::OriginalContractSum => self.original_contract_sum = Some(value),
            TotalsField::ContractSumToDate => self.contract_sum_to_date = Some(value),
            TotalsField::TotalCompletedToDate => self.total_completed_to_date = Some(value),
            TotalsField::CurrentPaymentDue => self.current_payment_due = Some(value),
        }
    }
}

/// One row of the G703 continuation sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_code: Option<String>,
    pub description: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub scheduled_value: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub work_completed_this_period: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub total_completed_to_date: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub balance_to_finish: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub percent_complete: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub value_requested: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_verification: Option<bool>,
}

impl LineItem {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Numeric value of a canonical field, if it is numeric and set.
    pub fn amount(&self, field: LineField) -> Option<Decimal> {
        match field {
            LineField::ScheduledValue => self.scheduled_value,
            LineField::WorkCompletedThisPeriod => self.work_completed_this_period,
            LineField::TotalCompletedToDate => self.total_completed_to_date,
            LineField::BalanceToFinish => self.balance_to_finish,
            LineField::PercentComplete => self.percent_complete,
            LineField::ValueRequested => self.value_requested,
            LineField::BudgetCode | LineField::Description | LineField::NeedsVerification => None,
        }
    }

    /// Set a numeric canonical field. Returns `false` if the field is not numeric.
    pub fn set_amount(&mut self, field: LineField, value: Decimal) -> bool {
        let slot = match field {
            LineField::ScheduledValue => &mut self.scheduled_value,
            LineField::WorkCompletedThisPeriod => &mut self.work_completed_this_period,
            LineField::TotalCompletedToDate => &mut self.total_completed_to_date,
            LineField::BalanceToFinish => &mut self.balance_to_finish,
            LineField::PercentComplete => &mut self.percent_complete,
            LineField::ValueRequested => &mut self.value_requested,
            LineField::BudgetCode | LineField::Description | LineField::NeedsVerification => {
                return false
            }
        };
        *slot = Some(value);
        true
    }
}

/// Overall verdict on an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExtractionStatus {
    /// No issues were recorded.
    Ok,
    /// Issues were recorded but usable data remains.
    Partial,
    /// Nothing trustworthy could be extracted.
    Rejected,
}

/// Classification of a recorded defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueKind {
    MalformedJson,
    MissingRequiredField,
    TypeCoercionFailed,
    ExcludedRowAmbiguous,
    ArithmeticInconsistent,
}

/// One defect detected while normalizing a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    /// Offending field (wire key, or section key for whole sections).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Index of the offending row in the model's `lineItems` array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            row: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

/// The canonical record produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub schema_version: SchemaVersion,
    pub status: ExtractionStatus,
    pub project_info: ProjectInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g702_totals: Option<G702Totals>,
    pub line_items: Vec<LineItem>,
    pub issues: Vec<Issue>,
}

impl ExtractionResult {
    /// A result carrying a single issue and no data.
    pub fn rejected(schema_version: SchemaVersion, issue: Issue) -> Self {
        Self {
            schema_version,
            status: ExtractionStatus::Rejected,
            project_info: ProjectInfo::default(),
            g702_totals: None,
            line_items: Vec::new(),
            issues: vec![issue],
        }
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues_of(kind).next().is_some()
    }

    pub fn is_ok(&self) -> bool {
        self.status == ExtractionStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_unset_fields_are_omitted_not_zeroed() {
        let mut item = LineItem::new("Drywall - Level 3");
        item.set_amount(LineField::WorkCompletedThisPeriod, Decimal::from(12500));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["description"], "Drywall - Level 3");
        assert_eq!(json["workCompletedThisPeriod"], serde_json::json!(12500.0));
        assert!(json.get("scheduledValue").is_none());
        assert!(json.get("needsVerification").is_none());
    }

    #[test]
    fn test_zero_is_kept() {
        let mut item = LineItem::new("Sitework");
        item.set_amount(LineField::BalanceToFinish, Decimal::ZERO);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["balanceToFinish"], serde_json::json!(0.0));
    }

    #[test]
    fn test_set_amount_rejects_text_fields() {
        let mut item = LineItem::new("x");
        assert!(!item.set_amount(LineField::Description, Decimal::ONE));
        assert_eq!(item.description, "x");
    }

    #[test]
    fn test_project_info_dates_serialize_iso() {
        let info = ProjectInfo {
            name: Some("Riverside Medical".to_string()),
            period_end: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["periodEnd"], "2025-03-31");
        assert!(json["periodStart"].is_null());
    }

    #[test]
    fn test_result_wire_shape() {
        let result = ExtractionResult::rejected(
            SchemaVersion::V3Billable,
            Issue::new(IssueKind::MalformedJson, "no JSON object found"),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["schemaVersion"], "v3-billable");
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["issues"][0]["kind"], "malformed_json");
        assert!(json["lineItems"].as_array().unwrap().is_empty());
        assert!(json.get("g702Totals").is_none());
    }

    #[test]
    fn test_totals_accessors() {
        let mut totals = G702Totals::default();
        let value = Decimal::from_str("1250000.00").unwrap();
        totals.set(TotalsField::TotalCompletedToDate, value);
        assert_eq!(totals.get(TotalsField::TotalCompletedToDate), Some(value));
        assert_eq!(totals.get(TotalsField::CurrentPaymentDue), None);
    }
}
