//! Order- and precision-insensitive comparison of result sets.
//!
//! Every cell is mapped to a canonical value, each row is serialized to a
//! canonical JSON string, and rows are sorted by that string. Two results
//! match when their sorted canonical rows are equal position by position,
//! which is multiset equality over normalized rows.

use crate::model::{ColumnMatching, Row, TableResult, Value, ISO_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

const SCALE: f64 = 10_000.0;
/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Canonical form of a single cell.
///
/// Reals are rounded to 4 decimals and collapse to integers when integral.
/// Timestamps, and text shaped like a date or datetime, become ISO-8601 text;
/// blobs become their JSON byte array. The mapping is idempotent.
pub fn normalize_value(v: &Value) -> Value {
    match v {
        Value::Null => Value::Null,
        Value::Integer(i) => Value::Integer(*i),
        Value::Real(f) => normalize_real(*f),
        Value::Text(s) => match date_shaped(s).then(|| parse_temporal(s)).flatten() {
            Some(ts) => Value::Text(ts.format(ISO_FORMAT).to_string()),
            None => Value::Text(s.clone()),
        },
        Value::Timestamp(ts) => Value::Text(ts.format(ISO_FORMAT).to_string()),
        Value::Blob(bytes) => Value::Text(serde_json::to_string(bytes).unwrap_or_default()),
    }
}

fn normalize_real(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Text(f.to_string());
    }
    let scaled = f * SCALE;
    if !scaled.is_finite() {
        // too large to carry 4 decimals anyway
        return Value::Real(f);
    }
    let rounded = scaled.round() / SCALE;
    if rounded.fract() == 0.0 && rounded.abs() < MAX_EXACT_INT {
        Value::Integer(rounded as i64)
    } else {
        Value::Real(rounded)
    }
}

/// `YYYY-MM-DD` prefix, optionally followed by a time part.
fn date_shaped(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
        && (b.len() == 10 || b[10] == b' ' || b[10] == b'T')
}

/// Parse SQLite's textual date and datetime forms.
pub(crate) fn parse_temporal(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    let s = s.trim().trim_end_matches('Z');
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn normalize_row(row: &[Value]) -> Row {
    row.iter().map(normalize_value).collect()
}

/// Canonical JSON serialization of a row, used as both sort and equality key.
pub fn canonical_key(row: &[Value]) -> String {
    serde_json::to_string(row).unwrap_or_default()
}

/// Normalize every row and sort by canonical key (byte order).
pub fn normalize_rows(rows: &[Row]) -> Vec<Row> {
    let mut keyed: Vec<(String, Row)> = rows
        .iter()
        .map(|r| {
            let n = normalize_row(r);
            (canonical_key(&n), n)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, r)| r).collect()
}

fn sorted_keys(rows: &[Row]) -> Vec<String> {
    let mut keys: Vec<String> = rows
        .iter()
        .map(|r| canonical_key(&normalize_row(r)))
        .collect();
    keys.sort();
    keys
}

/// Order-independent equality of two row sets. Duplicates count.
pub fn compare_rows(actual: &[Row], expected: &[Row]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    sorted_keys(actual) == sorted_keys(expected)
}

/// Compare two tables under the given column policy.
///
/// `Values` ignores field names entirely. `Named` requires the same multiset
/// of field names, then lines up each row's values by name so that column
/// order stops mattering.
pub fn compare_tables(actual: &TableResult, expected: &TableResult, matching: ColumnMatching) -> bool {
    match matching {
        ColumnMatching::Values => compare_rows(&actual.rows, &expected.rows),
        ColumnMatching::Named => {
            if actual.rows.len() != expected.rows.len() {
                return false;
            }
            let mut a_fields: Vec<&str> = actual.fields.iter().map(String::as_str).collect();
            let mut e_fields: Vec<&str> = expected.fields.iter().map(String::as_str).collect();
            a_fields.sort_unstable();
            e_fields.sort_unstable();
            if a_fields != e_fields {
                return false;
            }
            compare_rows(&by_field_name(actual), &by_field_name(expected))
        }
    }
}

/// Rows with columns reordered by field name (stable for duplicate names).
fn by_field_name(table: &TableResult) -> Vec<Row> {
    let mut order: Vec<usize> = (0..table.fields.len()).collect();
    order.sort_by(|&a, &b| table.fields[a].cmp(&table.fields[b]));
    table
        .rows
        .iter()
        .map(|row| order.iter().filter_map(|&i| row.get(i).cloned()).collect())
        .collect()
}

/// Multiset difference between two result sets over normalized rows.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RowDiff {
    /// Present in expected, absent (or too few times) in actual.
    pub missing: Vec<Row>,
    /// Present in actual, absent (or too many times) in expected.
    pub unexpected: Vec<Row>,
}

impl RowDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

pub fn diff_tables(actual: &TableResult, expected: &TableResult) -> RowDiff {
    let mut counts: BTreeMap<String, (i64, Row)> = BTreeMap::new();
    for row in normalize_rows(&expected.rows) {
        let entry = counts
            .entry(canonical_key(&row))
            .or_insert_with(|| (0, row));
        entry.0 += 1;
    }

    let mut unexpected = Vec::new();
    for row in normalize_rows(&actual.rows) {
        match counts.get_mut(&canonical_key(&row)) {
            Some(entry) if entry.0 > 0 => entry.0 -= 1,
            _ => unexpected.push(row),
        }
    }

    let mut missing = Vec::new();
    for (_, (n, row)) in counts {
        for _ in 0..n {
            missing.push(row.clone());
        }
    }

    RowDiff {
        missing,
        unexpected,
    }
}
