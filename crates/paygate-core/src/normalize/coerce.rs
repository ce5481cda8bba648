//! Type coercion for model-emitted field values.

use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Number, Value};

use crate::schema::FieldKind;

/// A value coerced to its declared semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Text(String),
    Date(NaiveDate),
    Number(Decimal),
    Flag(bool),
}

/// Result of coercing one raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// Key missing, `null`, or blank.
    Absent,
    Value(Coerced),
    /// Present but unusable; carries the reason.
    Failed(String),
}

static PLAIN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").unwrap());

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").unwrap());

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").unwrap());

static US_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})$").unwrap());

const WRITTEN_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%d %B, %Y"];

/// Coerce a raw JSON value to a semantic type.
pub fn coerce(value: Option<&Value>, kind: FieldKind) -> Coercion {
    let value = match value {
        None | Some(Value::Null) => return Coercion::Absent,
        Some(Value::String(s)) if s.trim().is_empty() => return Coercion::Absent,
        Some(v) => v,
    };

    let coerced = match kind {
        FieldKind::Text => coerce_text(value).map(Coerced::Text),
        FieldKind::Date => coerce_date(value).map(Coerced::Date),
        FieldKind::Currency => coerce_currency(value).map(Coerced::Number),
        FieldKind::Percent => coerce_percent(value).map(Coerced::Number),
        FieldKind::Boolean => coerce_bool(value).map(Coerced::Flag),
    };

    match coerced {
        Ok(v) => Coercion::Value(v),
        Err(reason) => Coercion::Failed(reason),
    }
}

fn describe(value: &Value) -> String {
    let rendered = value.to_string();
    crate::error::sanitize_excerpt(&rendered, 40)
}

fn coerce_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("expected text, got {}", describe(other))),
    }
}

fn coerce_date(value: &Value) -> Result<NaiveDate, String> {
    match value {
        Value::String(s) => {
            parse_date(s).ok_or_else(|| format!("unrecognized date {}", describe(value)))
        }
        other => Err(format!("expected a date string, got {}", describe(other))),
    }
}

fn coerce_currency(value: &Value) -> Result<Decimal, String> {
    match value {
        Value::Number(n) => {
            number_to_decimal(n).ok_or_else(|| format!("number {} is out of range", n))
        }
        Value::String(s) => {
            parse_currency(s).ok_or_else(|| format!("unrecognized amount {}", describe(value)))
        }
        other => Err(format!("expected an amount, got {}", describe(other))),
    }
}

fn coerce_percent(value: &Value) -> Result<Decimal, String> {
    match value {
        Value::Number(n) => {
            number_to_decimal(n).ok_or_else(|| format!("number {} is out of range", n))
        }
        Value::String(s) => {
            parse_percent(s).ok_or_else(|| format!("unrecognized percentage {}", describe(value)))
        }
        other => Err(format!("expected a percentage, got {}", describe(other))),
    }
}

fn coerce_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" => Ok(true),
            "false" | "no" | "n" => Ok(false),
            _ => Err(format!("expected true or false, got {}", describe(value))),
        },
        other => Err(format!("expected true or false, got {}", describe(other))),
    }
}

fn number_to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    let rendered = n.to_string();
    Decimal::from_str(&rendered)
        .or_else(|_| Decimal::from_scientific(&rendered))
        .ok()
}

/// Parse a currency string such as `$1,234.56`, `(500.00)` or `-`.
///
/// A lone dash is the G703 convention for zero.
pub fn parse_currency(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if matches!(s, "-" | "\u{2013}" | "\u{2014}") {
        return Some(Decimal::ZERO);
    }

    let (s, parenthesized) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (s, false),
    };

    let compact: String = s
        .trim()
        .trim_start_matches("USD")
        .chars()
        .filter(|c| !matches!(c, '$' | ' ' | '\u{00a0}'))
        .collect();

    // Commas are only accepted as thousands separators
    if !AMOUNT.is_match(&compact) {
        return None;
    }
    let cleaned = compact.replace(',', "");

    let value = Decimal::from_str(&cleaned).ok()?;
    if parenthesized {
        if value.is_sign_negative() {
            return None;
        }
        Some(-value)
    } else {
        Some(value)
    }
}

/// Parse a percentage string such as `45.5%` or `45.5`.
pub fn parse_percent(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if !PLAIN_NUMBER.is_match(&cleaned) {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Parse the date spellings seen on pay applications.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    // Timestamps: keep the date part
    let s = match s.char_indices().nth(10) {
        Some((idx, 'T')) => &s[..idx],
        _ => s,
    };

    if let Some(caps) = ISO_DATE.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = US_DATE.captures(s) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = match caps[3].len() {
            2 => 2000 + caps[3].parse::<i32>().ok()?,
            _ => caps[3].parse().ok()?,
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let written = s.replace('.', "");
    WRITTEN_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&written, fmt).ok())
}
