//! Distributional summaries of a single searchable field.
//!
//! Statistics are computed over the field's distinct stored values and are
//! recomputed with a full scan on every call.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::model::{EntityKind, Value, ValueType};
use crate::store::{quote, Index};

/// Number of text samples listed before the `...` marker.
pub const TEXT_SAMPLE_LIMIT: usize = 10;

/// Marker appended to text samples when more values exist.
pub const MORE_MARKER: &str = "...";

/// Placeholder reported for fields without a summary (dates).
pub const UNSUPPORTED_STATS: &str = "statistics unavailable for this field type";

/// Summary of one field as returned by [`Index::field_info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    /// Name as requested.
    pub field_name: String,
    /// Declaring kind.
    pub entity_kind: EntityKind,
    /// Declared type.
    pub value_type: ValueType,
    /// Type-dependent summary.
    pub stats: FieldStats,
}

/// Summary shape depends on the field type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldStats {
    /// Integer and float fields.
    Numeric(NumericStats),
    /// Text fields.
    Text(TextStats),
    /// Any other type.
    Unsupported(&'static str),
}

/// Summary of a numeric field. `count` excludes nulls and NaN; `std_dev` is
/// the sample standard deviation and 0 for fewer than two values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct NumericStats {
    pub count: usize,
    pub unique_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub has_missing: bool,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: f64,
}

/// Summary of a text field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct TextStats {
    pub count: usize,
    pub unique_count: usize,
    pub sample_values: Vec<String>,
}

/// Summarizes `values` as a field of type `value_type`.
pub fn summarize(value_type: ValueType, values: &[Value]) -> FieldStats {
    match value_type {
        ValueType::Integer | ValueType::Float => FieldStats::Numeric(numeric(values)),
        ValueType::Text => FieldStats::Text(text(values)),
        ValueType::Date => FieldStats::Unsupported(UNSUPPORTED_STATS),
    }
}

fn numeric(values: &[Value]) -> NumericStats {
    let mut has_missing = false;
    let mut present = Vec::with_capacity(values.len());
    for value in values {
        match value.as_f64() {
            Some(v) if !v.is_nan() => present.push(v),
            _ => has_missing = true,
        }
    }
    present.sort_by(f64::total_cmp);
    let mut unique = present.clone();
    unique.dedup();

    let count = present.len();
    let mean = (count > 0).then(|| present.iter().sum::<f64>() / count as f64);
    let median = match count {
        0 => None,
        n if n % 2 == 1 => Some(present[n / 2]),
        n => Some((present[n / 2 - 1] + present[n / 2]) / 2.0),
    };
    let std_dev = match mean {
        Some(mean) if count > 1 => {
            let sum_sq: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        }
        _ => 0.0,
    };

    NumericStats {
        count,
        unique_count: unique.len(),
        min: present.first().copied(),
        max: present.last().copied(),
        has_missing,
        mean,
        median,
        std_dev,
    }
}

fn text(values: &[Value]) -> TextStats {
    let present: Vec<&str> = values
        .iter()
        .filter_map(|v| match v {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    let distinct: BTreeSet<&str> = present.iter().copied().collect();
    let mut sample_values: Vec<String> = distinct
        .iter()
        .take(TEXT_SAMPLE_LIMIT)
        .map(|s| (*s).to_owned())
        .collect();
    if distinct.len() > TEXT_SAMPLE_LIMIT {
        sample_values.push(MORE_MARKER.to_owned());
    }
    TextStats {
        count: present.len(),
        unique_count: distinct.len(),
        sample_values,
    }
}

impl Index {
    /// Summarizes the searchable field `field_name` (bare or qualified).
    pub fn field_info(&self, field_name: &str) -> Result<FieldInfo> {
        let field = self.catalog().resolve(field_name)?.clone();
        let sql = format!(
            "SELECT DISTINCT {} FROM {}",
            quote(field.name),
            quote(field.kind.name())
        );
        let values = {
            let conn = self.lock();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| Value::read(row, 0, field.value_type))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        debug!(field = field_name, distinct = values.len(), "scanned field values");

        Ok(FieldInfo {
            field_name: field_name.to_owned(),
            entity_kind: field.kind,
            value_type: field.value_type,
            stats: summarize(field.value_type, &values),
        })
    }
}
