//! Raw API rows → cleaned dataset.
//!
//! Steps, in order:
//! 1. rename `province→region`, `type→internal_type`, `amount→total`, `date→date`
//! 2. coerce `total` to a number (failures become missing)
//! 3. coerce `date` to a calendar date and derive `month`/`year`
//! 4. drop exact duplicate rows (first occurrence wins)
//! 5. drop rows whose `total` is missing
//!
//! Malformed values never raise; they only turn into missing cells.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::domain::{CleanDataset, CleanRecord, Column, RawTable, RawValue, Schema};

/// Source column name → canonical column.
const RENAMES: [(&str, Column); 4] = [
    ("province", Column::Region),
    ("type", Column::InternalType),
    ("amount", Column::Total),
    ("date", Column::Date),
];

/// Counters describing what normalization did to the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Rows received from the API (before any cleaning).
    pub rows_read: usize,
    /// Non-null `total` values that failed numeric coercion.
    pub invalid_totals: usize,
    /// Non-null `date` values that failed date coercion.
    pub invalid_dates: usize,
    pub duplicates_removed: usize,
    pub dropped_missing_total: usize,
    pub rows_used: usize,
}

/// Normalize a raw payload into the cleaned dataset.
pub fn normalize(raw: &RawTable) -> CleanDataset {
    normalize_with_report(raw).0
}

/// Same as [`normalize`], also returning what was dropped and why.
pub fn normalize_with_report(raw: &RawTable) -> (CleanDataset, NormalizeReport) {
    let layout = resolve_layout(raw);
    let mut report = NormalizeReport {
        rows_read: raw.len(),
        ..NormalizeReport::default()
    };

    // Steps 2-3: coercion into staged rows (total still optional).
    let staged: Vec<StagedRow> = raw
        .records
        .iter()
        .map(|rec| {
            let total_raw = layout.total.map(|i| rec.get(i));
            let total = total_raw.and_then(coerce_total);
            if total.is_none() && total_raw.is_some_and(|v| !v.is_null()) {
                report.invalid_totals += 1;
            }

            let date_raw = layout.date.map(|i| rec.get(i));
            let date = date_raw.and_then(coerce_date);
            if date.is_none() && date_raw.is_some_and(|v| !v.is_null()) {
                report.invalid_dates += 1;
            }

            StagedRow {
                region: layout.region.map(|i| rec.get(i).clone()),
                internal_type: layout.internal_type.map(|i| rec.get(i).clone()),
                total,
                date,
                extras: layout.extras.iter().map(|&i| rec.get(i).clone()).collect(),
            }
        })
        .collect();

    // Step 4: exact duplicates.
    let mut seen: HashSet<Vec<KeyCell>> = HashSet::with_capacity(staged.len());
    let mut unique = Vec::with_capacity(staged.len());
    for row in staged {
        if seen.insert(row.key()) {
            unique.push(row);
        } else {
            report.duplicates_removed += 1;
        }
    }

    // Step 5: rows without a usable total.
    let mut records = Vec::with_capacity(unique.len());
    for row in unique {
        match row.total {
            Some(total) => records.push(CleanRecord {
                region: row.region.as_ref().and_then(RawValue::as_label),
                internal_type: row.internal_type.as_ref().and_then(RawValue::as_label),
                total,
                date: row.date,
                month: row.date.map(|d| d.month()),
                year: row.date.map(|d| d.year()),
                extras: row.extras,
            }),
            None => report.dropped_missing_total += 1,
        }
    }
    report.rows_used = records.len();

    if report.invalid_totals > 0 || report.invalid_dates > 0 {
        debug!(
            invalid_totals = report.invalid_totals,
            invalid_dates = report.invalid_dates,
            "coerced unparseable values to missing"
        );
    }
    info!(
        rows_read = report.rows_read,
        duplicates = report.duplicates_removed,
        dropped = report.dropped_missing_total,
        rows_used = report.rows_used,
        "normalized dataset"
    );

    (
        CleanDataset {
            schema: layout.schema,
            records,
        },
        report,
    )
}

/// Where each canonical column comes from in the raw table.
struct Layout {
    schema: Schema,
    region: Option<usize>,
    internal_type: Option<usize>,
    total: Option<usize>,
    date: Option<usize>,
    /// Raw indices of pass-through columns, in schema order.
    extras: Vec<usize>,
}

fn resolve_layout(raw: &RawTable) -> Layout {
    // An already-canonical column wins over its source name, so renaming twice
    // is a no-op and the two never collide; the source then passes through.
    let source_for = |target: &Column, source: &str| {
        raw.column_index(target.name()).or_else(|| raw.column_index(source))
    };

    let mut resolved: Vec<(Column, usize)> = Vec::new();
    for (source, target) in RENAMES.iter() {
        if let Some(idx) = source_for(target, source) {
            resolved.push((target.clone(), idx));
        }
    }
    let index_of = |col: &Column| resolved.iter().find(|(c, _)| c == col).map(|(_, i)| *i);
    let date = index_of(&Column::Date);

    let mut columns = Vec::with_capacity(raw.columns.len() + 2);
    let mut extras = Vec::new();
    for (idx, name) in raw.columns.iter().enumerate() {
        if let Some((col, _)) = resolved.iter().find(|(_, i)| *i == idx) {
            columns.push(col.clone());
            continue;
        }
        // Derived from `date` below; a raw column of the same name is replaced.
        if date.is_some() && (name == "month" || name == "year") {
            continue;
        }
        columns.push(Column::Extra(name.clone()));
        extras.push(idx);
    }
    if date.is_some() {
        columns.push(Column::Month);
        columns.push(Column::Year);
    }

    Layout {
        region: index_of(&Column::Region),
        internal_type: index_of(&Column::InternalType),
        total: index_of(&Column::Total),
        date,
        schema: Schema { columns },
        extras,
    }
}

struct StagedRow {
    region: Option<RawValue>,
    internal_type: Option<RawValue>,
    total: Option<f64>,
    date: Option<NaiveDate>,
    extras: Vec<RawValue>,
}

/// Hashable image of a staged row for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyCell {
    Absent,
    Null,
    Bool(bool),
    Num(u64),
    Text(String),
    Date(NaiveDate),
}

impl KeyCell {
    fn num(v: f64) -> Self {
        // -0.0 == 0.0 for duplicate purposes.
        let v = if v == 0.0 { 0.0 } else { v };
        KeyCell::Num(v.to_bits())
    }

    fn label(v: Option<&RawValue>) -> Self {
        match v {
            None => KeyCell::Absent,
            Some(v) => v.as_label().map(KeyCell::Text).unwrap_or(KeyCell::Null),
        }
    }

    fn raw(v: &RawValue) -> Self {
        match v {
            RawValue::Null => KeyCell::Null,
            RawValue::Bool(b) => KeyCell::Bool(*b),
            RawValue::Number(n) => KeyCell::num(*n),
            RawValue::Text(s) => KeyCell::Text(s.clone()),
        }
    }
}

impl StagedRow {
    fn key(&self) -> Vec<KeyCell> {
        let mut key = Vec::with_capacity(4 + self.extras.len());
        // Labels compare as the strings stored in the clean record.
        key.push(KeyCell::label(self.region.as_ref()));
        key.push(KeyCell::label(self.internal_type.as_ref()));
        key.push(self.total.map(KeyCell::num).unwrap_or(KeyCell::Null));
        key.push(self.date.map(KeyCell::Date).unwrap_or(KeyCell::Null));
        key.extend(self.extras.iter().map(KeyCell::raw));
        key
    }
}

/// Numeric coercion for `total`; anything unusable is `None`.
pub fn coerce_total(value: &RawValue) -> Option<f64> {
    let v = match value {
        RawValue::Null => return None,
        RawValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        RawValue::Number(n) => *n,
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
    };
    if v.is_finite() { Some(v) } else { None }
}

/// Date coercion for `date`; only text values are considered.
pub fn coerce_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Text(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // ISO dates are what the API sends. Ambiguous numeric layouts are read
    // month-first.
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y"];
    const DATETIME_FMTS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // Year-month only: first day of the month.
    if s.len() == 7 {
        return NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok();
    }
    None
}
