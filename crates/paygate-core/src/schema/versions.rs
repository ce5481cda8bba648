//! Built-in schema versions. Never edit a published version; add a new one.

use super::{
    ArithmeticCheck, FieldSpec, LineField, ProjectField, RowRules, SchemaDefinition,
    SchemaVersion, TotalsField,
};

use super::FieldKind::{Boolean, Currency, Date, Percent, Text};
use super::FieldTarget::{Line, Project, Totals};

const SUMMARY_ROWS: &[&str] = &["TOTALS", "GRAND TOTAL", "SUBTOTAL", "CHANGE ORDERS"];

const NON_BILLABLE_KEYWORDS: &[&str] = &[
    "GENERAL CONDITIONS",
    "GENERAL REQUIREMENTS",
    "SUPERVISION",
    "BOND",
    "INSURANCE",
    "PERMIT",
    "OVERHEAD",
    "FEE",
    "CONTINGENCY",
    "RETAINAGE",
];

const BALANCE_CHECK: ArithmeticCheck = ArithmeticCheck::Difference {
    target: LineField::BalanceToFinish,
    minuend: LineField::ScheduledValue,
    subtrahend: LineField::TotalCompletedToDate,
};

const PERCENT_CHECK: ArithmeticCheck = ArithmeticCheck::Percentage {
    target: LineField::PercentComplete,
    numerator: LineField::TotalCompletedToDate,
    denominator: LineField::ScheduledValue,
};

pub(super) fn v1_full() -> SchemaDefinition {
    SchemaDefinition::new(
        SchemaVersion::V1Full,
        "G702 summary with full G703 continuation sheet",
        "PAGE 1 is the G702 APPLICATION AND CERTIFICATE FOR PAYMENT. \
         Read the project information and the summary totals from its numbered lines.\n\
         PAGES 2+ are the G703 CONTINUATION SHEET, a table with columns A through I.",
        vec![
            FieldSpec::required("name", Project(ProjectField::Name), Text, "PROJECT: field on page 1"),
            FieldSpec::optional("payAppDate", Project(ProjectField::PayAppDate), Date, "APPLICATION DATE on page 1"),
            FieldSpec::required("periodStart", Project(ProjectField::PeriodStart), Date, "start of the PERIOD field on page 1"),
            FieldSpec::required("periodEnd", Project(ProjectField::PeriodEnd), Date, "end of the PERIOD field on page 1"),
            FieldSpec::optional("originalContractSum", Totals(TotalsField::OriginalContractSum), Currency, "G702 Line 1, Original Contract Sum"),
            FieldSpec::optional("contractSumToDate", Totals(TotalsField::ContractSumToDate), Currency, "G702 Line 3, Contract Sum to Date (Line 1 + 2)"),
            FieldSpec::optional("totalCompletedToDate", Totals(TotalsField::TotalCompletedToDate), Currency, "G702 Line 4, Total Completed and Stored to Date"),
            FieldSpec::optional("currentPaymentDue", Totals(TotalsField::CurrentPaymentDue), Currency, "G702 Line 8, Current Payment Due"),
            FieldSpec::optional("budgetCode", Line(LineField::BudgetCode), Text, "Column B, budget code (like \"17-200.O\")"),
            FieldSpec::required("description", Line(LineField::Description), Text, "Column C, Description of Work"),
            FieldSpec::required("scheduledValue", Line(LineField::ScheduledValue), Currency, "Column D, Scheduled Value"),
            FieldSpec::optional("workCompleted", Line(LineField::WorkCompletedThisPeriod), Currency, "Column E, Work Completed This Period"),
            FieldSpec::optional("totalCompletedToDate", Line(LineField::TotalCompletedToDate), Currency, "Column G, Total Completed and Stored to Date"),
            FieldSpec::optional("balanceToFinish", Line(LineField::BalanceToFinish), Currency, "Column H, Balance to Finish"),
            FieldSpec::optional("percentComplete", Line(LineField::PercentComplete), Percent, "% column (G / C)"),
        ],
        RowRules {
            summary_rows: SUMMARY_ROWS,
            excluded_keywords: &[],
            min_nonzero: None,
        },
        vec![
            BALANCE_CHECK,
            PERCENT_CHECK,
            ArithmeticCheck::ColumnSum {
                total: TotalsField::TotalCompletedToDate,
                column: LineField::TotalCompletedToDate,
            },
        ],
    )
}

pub(super) fn v2_g703() -> SchemaDefinition {
    SchemaDefinition::new(
        SchemaVersion::V2G703,
        "G703 continuation sheet with percent complete",
        "Read the project name and period from the header of the G703 CONTINUATION SHEET, \
         then every row of its table (columns A through I).",
        vec![
            FieldSpec::required("name", Project(ProjectField::Name), Text, "PROJECT: field in the sheet header"),
            FieldSpec::optional("payAppDate", Project(ProjectField::PayAppDate), Date, "APPLICATION DATE in the sheet header"),
            FieldSpec::optional("periodStart", Project(ProjectField::PeriodStart), Date, "start of the PERIOD field"),
            FieldSpec::optional("periodEnd", Project(ProjectField::PeriodEnd), Date, "end of the PERIOD field"),
            FieldSpec::optional("budgetCode", Line(LineField::BudgetCode), Text, "Column B, budget code"),
            FieldSpec::required("description", Line(LineField::Description), Text, "Column C, Description of Work"),
            FieldSpec::required("scheduledValue", Line(LineField::ScheduledValue), Currency, "Column D, Scheduled Value"),
            FieldSpec::optional("workCompletedThisPeriod", Line(LineField::WorkCompletedThisPeriod), Currency, "Column E, Work Completed This Period"),
            FieldSpec::optional("totalCompletedToDate", Line(LineField::TotalCompletedToDate), Currency, "Column G, Total Completed and Stored to Date"),
            FieldSpec::required("percentComplete", Line(LineField::PercentComplete), Percent, "% column (G / C)"),
            FieldSpec::optional("balanceToFinish", Line(LineField::BalanceToFinish), Currency, "Column H, Balance to Finish"),
        ],
        RowRules {
            summary_rows: SUMMARY_ROWS,
            excluded_keywords: &[],
            min_nonzero: None,
        },
        vec![BALANCE_CHECK, PERCENT_CHECK],
    )
}

pub(super) fn v3_billable() -> SchemaDefinition {
    SchemaDefinition::new(
        SchemaVersion::V3Billable,
        "G703 rows billed this period",
        "Read the project name and period from the pay application, then the G703 \
         CONTINUATION SHEET table. Only rows billed in THIS PERIOD are wanted.",
        vec![
            FieldSpec::optional("name", Project(ProjectField::Name), Text, "PROJECT: field"),
            FieldSpec::optional("payAppDate", Project(ProjectField::PayAppDate), Date, "APPLICATION DATE"),
            FieldSpec::optional("periodStart", Project(ProjectField::PeriodStart), Date, "start of the PERIOD field"),
            FieldSpec::optional("periodEnd", Project(ProjectField::PeriodEnd), Date, "end of the PERIOD field"),
            FieldSpec::optional("budgetCode", Line(LineField::BudgetCode), Text, "Column B, budget code"),
            FieldSpec::required("description", Line(LineField::Description), Text, "Column C, Description of Work"),
            FieldSpec::required("workCompletedThisPeriod", Line(LineField::WorkCompletedThisPeriod), Currency, "Column E, Work Completed This Period"),
            FieldSpec::optional("valueRequested", Line(LineField::ValueRequested), Currency, "value requested for the line on this application"),
            FieldSpec::optional("needsVerification", Line(LineField::NeedsVerification), Boolean, "true when any value in the row was hard to read"),
        ],
        RowRules {
            summary_rows: SUMMARY_ROWS,
            excluded_keywords: NON_BILLABLE_KEYWORDS,
            min_nonzero: Some(LineField::WorkCompletedThisPeriod),
        },
        vec![],
    )
}
