//! Explicit coercion of raw text and JSON scalars into typed [`Value`]s.
//!
//! Attribute tables written under different locales use either `.` or `,` as
//! the decimal separator, so every numeric path normalizes the separator
//! before parsing. Dates are accepted as ISO `YYYY-MM-DD` or the compact
//! `YYYYMMDD` form found in attribute tables.

use time::macros::format_description;
use time::Date;

use crate::error::{IndexError, Result};

use super::{Value, ValueType};

/// Replaces the first `,` decimal separator with `.` and trims whitespace.
pub fn normalize_decimal(raw: &str) -> String {
    raw.trim().replacen(',', ".", 1)
}

/// Removes one pair of matching single or double quotes around `raw`.
pub fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Parses a finite float after decimal-separator normalization.
///
/// `NaN`, `inf` and values that overflow to infinity are rejected.
pub fn parse_float_text(raw: &str) -> Option<f64> {
    normalize_decimal(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parses an integer; integral decimal text such as `"12.0"` is accepted.
pub fn parse_integer_text(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    parse_float_text(trimmed).and_then(integral)
}

/// Parses an ISO or compact date.
pub fn parse_date_text(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .or_else(|_| Date::parse(trimmed, format_description!("[year][month][day]")))
        .ok()
}

/// Renders a date as ISO `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64).then_some(v as i64)
}

/// Coerces query text to `ty`. Surrounding quotes are stripped for every type.
pub fn from_text(field: &str, ty: ValueType, raw: &str) -> Result<Value> {
    let unquoted = strip_quotes(raw.trim());
    match ty {
        ValueType::Text => Ok(Value::Text(unquoted.to_owned())),
        ValueType::Integer => parse_integer_text(unquoted)
            .map(Value::Integer)
            .ok_or_else(|| IndexError::validation(field, format!("'{raw}' is not an integer"))),
        ValueType::Float => parse_float_text(unquoted)
            .map(Value::Float)
            .ok_or_else(|| IndexError::validation(field, format!("'{raw}' is not a number"))),
        ValueType::Date => parse_date_text(unquoted)
            .map(Value::Date)
            .ok_or_else(|| IndexError::validation(field, format!("'{raw}' is not a date"))),
    }
}

/// Coerces an extracted JSON scalar to `ty`.
///
/// `None` and JSON `null` yield [`Value::Null`] when `nullable`, otherwise a
/// validation error for the missing column.
pub fn from_json(
    field: &str,
    ty: ValueType,
    raw: Option<&serde_json::Value>,
    nullable: bool,
) -> Result<Value> {
    use serde_json::Value as Json;

    let raw = match raw {
        None | Some(Json::Null) if nullable => return Ok(Value::Null),
        None | Some(Json::Null) => return Err(IndexError::validation(field, "missing value")),
        Some(raw) => raw,
    };
    match (ty, raw) {
        (ValueType::Text, Json::String(s)) => Ok(Value::Text(s.clone())),
        (ValueType::Text, Json::Number(n)) => Ok(Value::Text(n.to_string())),
        (ValueType::Text, Json::Bool(b)) => Ok(Value::Text(b.to_string())),
        (ValueType::Integer, Json::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .map(Value::Integer)
            .ok_or_else(|| IndexError::validation(field, format!("{n} is not an integer"))),
        (ValueType::Float, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| IndexError::validation(field, format!("{n} is not a number"))),
        (ValueType::Date, Json::Number(n)) => from_text(field, ty, &n.to_string()),
        (ValueType::Date, Json::String(s)) if s.trim().is_empty() && nullable => Ok(Value::Null),
        (_, Json::String(s)) => from_text(field, ty, s),
        (_, other) => Err(IndexError::validation(
            field,
            format!("unsupported {ty} value {other}"),
        )),
    }
}
