//! Raw and cleaned procurement records.
//!
//! The API sends an array of JSON objects whose keys vary between calls. We keep
//! that shape as a column-aligned `RawTable` of `RawValue`s so unknown columns can
//! travel through normalization untouched. After normalization, the well-known
//! columns become typed fields on `CleanRecord` and the dataset-level `Schema`
//! says which of them actually exist.

use std::fmt;

use chrono::NaiveDate;
use serde_json::Value;

/// A loosely-typed cell as delivered by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    /// Strings, plus nested arrays/objects carried as their JSON text.
    Text(String),
}

impl RawValue {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Null),
            Value::String(s) => RawValue::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => RawValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Text view used for label columns (`region`, `internal_type`).
    pub fn as_label(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Number(n) => write!(f, "{}", fmt_number(*n)),
            RawValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Whole numbers print without a fractional part.
pub fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// One API row, aligned with `RawTable::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub values: Vec<RawValue>,
}

static NULL: RawValue = RawValue::Null;

impl RawRecord {
    pub fn get(&self, idx: usize) -> &RawValue {
        self.values.get(idx).unwrap_or(&NULL)
    }
}

/// Tabular API payload: union of keys (first-seen order) plus aligned rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Decode an API payload.
    ///
    /// `[]`, `null` and `{}` decode to an empty table. Any other non-array shape,
    /// or an array holding non-objects, is rejected.
    pub fn from_json(payload: Value) -> Result<Self, String> {
        let items = match payload {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) if map.is_empty() => return Ok(Self::default()),
            Value::Array(items) => items,
            other => {
                return Err(format!(
                    "expected a JSON array of objects, got {}",
                    json_kind(&other)
                ));
            }
        };

        let mut objects = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(map) => objects.push(map),
                other => {
                    return Err(format!(
                        "element {idx} is {}, expected an object",
                        json_kind(&other)
                    ));
                }
            }
        }

        let mut columns: Vec<String> = Vec::new();
        for obj in &objects {
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let records = objects
            .into_iter()
            .map(|obj| RawRecord {
                values: columns
                    .iter()
                    .map(|c| obj.get(c).cloned().map(RawValue::from_json).unwrap_or(RawValue::Null))
                    .collect(),
            })
            .collect();

        Ok(Self { columns, records })
    }

    pub fn from_json_str(body: &str) -> Result<Self, String> {
        let payload: Value = serde_json::from_str(body).map_err(|e| format!("invalid JSON: {e}"))?;
        Self::from_json(payload)
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A column of the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Region,
    InternalType,
    Total,
    Date,
    Month,
    Year,
    /// Unmapped API column, passed through unchanged.
    Extra(String),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Region => "region",
            Column::InternalType => "internal_type",
            Column::Total => "total",
            Column::Date => "date",
            Column::Month => "month",
            Column::Year => "year",
            Column::Extra(name) => name,
        }
    }
}

/// Derived views a shell may render, keyed by the columns they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    ByType,
    ByMonth,
    ByTypeAndMonth,
    ByYearAndType,
    ProportionByType,
    Summary,
}

impl View {
    pub const ALL: [View; 6] = [
        View::ByType,
        View::ByMonth,
        View::ByTypeAndMonth,
        View::ByYearAndType,
        View::ProportionByType,
        View::Summary,
    ];

    pub fn required_columns(self) -> &'static [Column] {
        const BY_TYPE: &[Column] = &[Column::InternalType, Column::Total];
        const BY_MONTH: &[Column] = &[Column::Month, Column::Total];
        const BY_TYPE_MONTH: &[Column] = &[Column::Month, Column::InternalType, Column::Total];
        const BY_YEAR_TYPE: &[Column] = &[Column::Year, Column::InternalType, Column::Total];
        const PROPORTION: &[Column] = &[Column::InternalType];
        const SUMMARY: &[Column] = &[Column::Total];

        match self {
            View::ByType => BY_TYPE,
            View::ByMonth => BY_MONTH,
            View::ByTypeAndMonth => BY_TYPE_MONTH,
            View::ByYearAndType => BY_YEAR_TYPE,
            View::ProportionByType => PROPORTION,
            View::Summary => SUMMARY,
        }
    }

    /// Chart title shown by the shells.
    pub fn title(self) -> &'static str {
        match self {
            View::ByType => "Monto total por tipo de contratación",
            View::ByMonth => "Evolución mensual de montos totales",
            View::ByTypeAndMonth => "Monto total por tipo de contratación y mes",
            View::ByYearAndType => "Montos totales por tipo de contratación por año",
            View::ProportionByType => "Proporción de contratos por tipo de contratación",
            View::Summary => "Estadísticas descriptivas",
        }
    }
}

/// Columns discovered at normalization time, in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn has(&self, column: &Column) -> bool {
        self.columns.contains(column)
    }

    /// Whether every column `view` depends on exists in this dataset.
    pub fn supports(&self, view: View) -> bool {
        view.required_columns().iter().all(|c| self.has(c))
    }

    /// Names of pass-through columns, aligned with `CleanRecord::extras`.
    pub fn extra_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                Column::Extra(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }
}

/// A normalized procurement record.
///
/// Optional fields are `None` either because the column is absent from the
/// dataset (see `Schema`) or because this row's value was missing/unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub region: Option<String>,
    pub internal_type: Option<String>,
    pub total: f64,
    pub date: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    /// Pass-through values, aligned with `Schema::extra_names()`.
    pub extras: Vec<RawValue>,
}

impl CleanRecord {
    /// Render one column as text (empty for missing values).
    pub fn field_text(&self, column: &Column, extra_idx: Option<usize>) -> String {
        match column {
            Column::Region => self.region.clone().unwrap_or_default(),
            Column::InternalType => self.internal_type.clone().unwrap_or_default(),
            Column::Total => format!("{:?}", self.total),
            Column::Date => self.date.map(|d| d.to_string()).unwrap_or_default(),
            Column::Month => self.month.map(|m| m.to_string()).unwrap_or_default(),
            Column::Year => self.year.map(|y| y.to_string()).unwrap_or_default(),
            Column::Extra(_) => extra_idx
                .and_then(|i| self.extras.get(i))
                .map(RawValue::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Output of normalization: schema plus cleaned rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanDataset {
    pub schema: Schema,
    pub records: Vec<CleanRecord>,
}

impl CleanDataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Row cells in schema order, as text.
    pub fn row_text(&self, record: &CleanRecord) -> Vec<String> {
        let mut extra_idx = 0usize;
        self.schema
            .columns
            .iter()
            .map(|c| match c {
                Column::Extra(_) => {
                    let s = record.field_text(c, Some(extra_idx));
                    extra_idx += 1;
                    s
                }
                _ => record.field_text(c, None),
            })
            .collect()
    }
}
