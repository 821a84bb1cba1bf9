//! Descriptive statistics per numeric column.

use crate::domain::{CleanDataset, Column, RawValue, View};

/// count / mean / std / min / quartiles / max for one column.
///
/// `std` is the sample standard deviation (n-1) and is `None` below two values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn from_values(column: impl Into<String>, values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let mean = if n == 0 {
            None
        } else {
            Some(sorted.iter().sum::<f64>() / n as f64)
        };
        let std = match mean {
            Some(m) if n >= 2 => {
                let var = sorted.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
                Some(var.sqrt())
            }
            _ => None,
        };

        Self {
            column: column.into(),
            count: n,
            mean,
            std,
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

impl CleanDataset {
    /// Statistics for every numeric column, in schema order.
    ///
    /// Numeric columns are `total`, `month`, `year`, and pass-through columns
    /// whose non-null values are all numbers.
    pub fn summary_statistics(&self) -> Option<Vec<ColumnSummary>> {
        if !self.schema.supports(View::Summary) {
            return None;
        }

        let mut out = Vec::new();
        let mut extra_idx = 0usize;
        for col in &self.schema.columns {
            let values: Option<Vec<f64>> = match col {
                Column::Total => Some(self.records.iter().map(|r| r.total).collect()),
                Column::Month => Some(self.records.iter().filter_map(|r| r.month.map(f64::from)).collect()),
                Column::Year => Some(self.records.iter().filter_map(|r| r.year.map(f64::from)).collect()),
                Column::Extra(_) => {
                    let idx = extra_idx;
                    extra_idx += 1;
                    numeric_extra(self, idx)
                }
                Column::Region | Column::InternalType | Column::Date => None,
            };
            if let Some(values) = values {
                out.push(ColumnSummary::from_values(col.name(), &values));
            }
        }
        Some(out)
    }
}

fn numeric_extra(ds: &CleanDataset, idx: usize) -> Option<Vec<f64>> {
    let mut values = Vec::new();
    for r in &ds.records {
        match r.extras.get(idx) {
            Some(RawValue::Number(n)) => values.push(*n),
            Some(RawValue::Null) | None => {}
            Some(_) => return None,
        }
    }
    if values.is_empty() { None } else { Some(values) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::normalize;
    use crate::domain::RawTable;

    #[test]
    fn quartiles_interpolate_linearly() {
        let s = ColumnSummary::from_values("total", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.median, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        assert_eq!(s.max, Some(4.0));
        let std = s.std.unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_std() {
        let s = ColumnSummary::from_values("total", &[7.0]);
        assert_eq!(s.std, None);
        assert_eq!(s.median, Some(7.0));
    }

    #[test]
    fn numeric_columns_are_described_in_schema_order() {
        let raw = RawTable::from_json_str(
            r#"[{"type":"A","amount":"10","date":"2022-01-05","score":1,"code":"x"},
                {"type":"B","amount":"30","date":"bad","score":null,"code":"y"}]"#,
        )
        .unwrap();
        let ds = normalize(&raw);
        let stats = ds.summary_statistics().unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["total", "score", "month", "year"]);

        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].mean, Some(20.0));
        // The unparsed date contributes no month/year.
        assert_eq!(stats[2].count, 1);
        assert_eq!(stats[3].min, Some(2022.0));
    }
}
