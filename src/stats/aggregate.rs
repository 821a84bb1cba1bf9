//! Grouped sums and scalar metrics over the cleaned dataset.
//!
//! Every view is recomputed from the records on each call. A view whose columns
//! are missing from the schema returns `None`; that is not an error, the shell
//! simply skips it.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{CleanDataset, CleanRecord, View};

/// Group key; rows with a missing value form their own group, sorted last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey<T> {
    Value(T),
    Missing,
}

impl<T> From<Option<T>> for GroupKey<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => GroupKey::Value(v),
            None => GroupKey::Missing,
        }
    }
}

impl<T: fmt::Display> fmt::Display for GroupKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Value(v) => write!(f, "{v}"),
            GroupKey::Missing => write!(f, "(sin dato)"),
        }
    }
}

/// One row of a grouped-sum view.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSum<K> {
    pub key: K,
    pub total: f64,
}

pub type TypeKey = GroupKey<String>;
pub type MonthKey = GroupKey<u32>;
pub type YearKey = GroupKey<i32>;

/// Record count and share of one contract type.
#[derive(Debug, Clone, PartialEq)]
pub struct Proportion {
    pub key: TypeKey,
    pub count: usize,
    pub share: f64,
}

/// Headline metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
}

fn group_sum<K: Ord + Clone>(records: &[CleanRecord], key: impl Fn(&CleanRecord) -> K) -> Vec<GroupSum<K>> {
    let mut groups: BTreeMap<K, f64> = BTreeMap::new();
    for r in records {
        *groups.entry(key(r)).or_insert(0.0) += r.total;
    }
    groups
        .into_iter()
        .map(|(key, total)| GroupSum { key, total })
        .collect()
}

fn type_key(r: &CleanRecord) -> TypeKey {
    r.internal_type.clone().into()
}

impl CleanDataset {
    /// Sum of `total` per `internal_type`.
    pub fn sum_by_type(&self) -> Option<Vec<GroupSum<TypeKey>>> {
        if !self.schema.supports(View::ByType) {
            return None;
        }
        Some(group_sum(&self.records, type_key))
    }

    /// Sum of `total` per calendar month.
    pub fn sum_by_month(&self) -> Option<Vec<GroupSum<MonthKey>>> {
        if !self.schema.supports(View::ByMonth) {
            return None;
        }
        Some(group_sum(&self.records, |r| r.month.into()))
    }

    /// Sum of `total` per `(month, internal_type)`.
    pub fn sum_by_type_and_month(&self) -> Option<Vec<GroupSum<(MonthKey, TypeKey)>>> {
        if !self.schema.supports(View::ByTypeAndMonth) {
            return None;
        }
        Some(group_sum(&self.records, |r| (r.month.into(), type_key(r))))
    }

    /// Sum of `total` per `(year, internal_type)`.
    pub fn sum_by_year_and_type(&self) -> Option<Vec<GroupSum<(YearKey, TypeKey)>>> {
        if !self.schema.supports(View::ByYearAndType) {
            return None;
        }
        Some(group_sum(&self.records, |r| (r.year.into(), type_key(r))))
    }

    /// Share of records per `internal_type` (counts, not amounts).
    pub fn proportion_by_type(&self) -> Option<Vec<Proportion>> {
        if !self.schema.supports(View::ProportionByType) {
            return None;
        }
        let mut counts: BTreeMap<TypeKey, usize> = BTreeMap::new();
        for r in &self.records {
            *counts.entry(type_key(r)).or_insert(0) += 1;
        }
        let n = self.records.len();
        Some(
            counts
                .into_iter()
                .map(|(key, count)| Proportion {
                    key,
                    count,
                    share: if n == 0 { 0.0 } else { count as f64 / n as f64 },
                })
                .collect(),
        )
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn total_sum(&self) -> f64 {
        self.records.iter().map(|r| r.total).sum()
    }

    /// Mean `total`; `None` on an empty dataset.
    pub fn mean_total(&self) -> Option<f64> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.total_sum() / self.records.len() as f64)
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            count: self.total_count(),
            sum: self.total_sum(),
            mean: self.mean_total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::normalize;
    use crate::domain::RawTable;

    fn dataset(body: &str) -> CleanDataset {
        normalize(&RawTable::from_json_str(body).unwrap())
    }

    fn sample() -> CleanDataset {
        dataset(
            r#"[
            {"province":"AZUAY","type":"Licitación","amount":"100","date":"2022-03-01"},
            {"province":"AZUAY","type":"Cotización","amount":"50","date":"2022-03-15"},
            {"province":"LOJA","type":"Licitación","amount":"25","date":"2022-04-02"},
            {"province":"LOJA","type":null,"amount":"5","date":"2021-04-02"},
            {"province":"NAPO","type":"Cotización","amount":"8","date":"sin fecha"}
        ]"#,
        )
    }

    #[test]
    fn scalar_metrics_match_example_scenario() {
        let ds = dataset(
            r#"[{"province":"AZUAY","type":"Licitación","amount":"100","date":"2022-03-01"},
                {"province":"AZUAY","type":"Licitación","amount":"100","date":"2022-03-01"}]"#,
        );
        assert_eq!(ds.total_count(), 1);
        assert_eq!(ds.total_sum(), 100.0);
        assert_eq!(ds.mean_total(), Some(100.0));
    }

    #[test]
    fn sum_by_type_partitions_total_sum() {
        let ds = sample();
        let by_type = ds.sum_by_type().unwrap();
        let keys: Vec<String> = by_type.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, vec!["Cotización", "Licitación", "(sin dato)"]);
        assert_eq!(by_type[0].total, 58.0);
        assert_eq!(by_type[1].total, 125.0);
        assert_eq!(by_type[2].total, 5.0);

        let group_total: f64 = by_type.iter().map(|g| g.total).sum();
        assert_eq!(group_total, ds.total_sum());
    }

    #[test]
    fn monthly_and_two_key_views_sort_by_key() {
        let ds = sample();
        let by_month = ds.sum_by_month().unwrap();
        assert_eq!(
            by_month,
            vec![
                GroupSum { key: GroupKey::Value(3), total: 150.0 },
                GroupSum { key: GroupKey::Value(4), total: 30.0 },
                GroupSum { key: GroupKey::Missing, total: 8.0 },
            ]
        );

        let by_year_type = ds.sum_by_year_and_type().unwrap();
        let first = &by_year_type[0];
        assert_eq!(first.key, (GroupKey::Value(2021), GroupKey::Missing));
        assert_eq!(first.total, 5.0);

        let by_month_type = ds.sum_by_type_and_month().unwrap();
        assert_eq!(
            by_month_type[0].key,
            (GroupKey::Value(3), GroupKey::Value("Cotización".to_string()))
        );
        let sum: f64 = by_month_type.iter().map(|g| g.total).sum();
        assert_eq!(sum, ds.total_sum());
    }

    #[test]
    fn proportions_sum_to_one() {
        let ds = sample();
        let props = ds.proportion_by_type().unwrap();
        let counts: Vec<usize> = props.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        let share: f64 = props.iter().map(|p| p.share).sum();
        assert!((share - 1.0).abs() < 1e-12);
    }

    #[test]
    fn views_are_omitted_when_columns_are_missing() {
        let ds = dataset(r#"[{"amount":"10"},{"amount":"20"}]"#);
        assert!(ds.sum_by_type().is_none());
        assert!(ds.sum_by_month().is_none());
        assert!(ds.sum_by_type_and_month().is_none());
        assert!(ds.sum_by_year_and_type().is_none());
        assert!(ds.proportion_by_type().is_none());
        assert_eq!(ds.total_sum(), 30.0);
        assert_eq!(ds.mean_total(), Some(15.0));
    }

    #[test]
    fn empty_dataset_has_no_mean() {
        let ds = dataset("[]");
        assert_eq!(ds.total_count(), 0);
        assert_eq!(ds.total_sum(), 0.0);
        assert_eq!(ds.mean_total(), None);
    }
}
