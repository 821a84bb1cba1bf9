//! Shared "load" pipeline used by both CLI and TUI front-ends.
//!
//! fetch (or saved payload) -> normalize -> dashboard
//!
//! The front-ends then only decide how to present the outcome.

use tracing::warn;

use crate::clean::{NormalizeReport, normalize_with_report};
use crate::data::{Clock, ComprasClient, FetchOutcome, Transport};
use crate::domain::{CleanDataset, FilterSet, RawTable, View};
use crate::error::AppError;

/// Everything a shell needs to render one load.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub filters: FilterSet,
    pub dataset: CleanDataset,
    pub report: NormalizeReport,
}

impl Dashboard {
    /// Views whose columns exist in this dataset, in display order.
    pub fn available_views(&self) -> Vec<View> {
        View::ALL
            .into_iter()
            .filter(|v| self.dataset.schema.supports(*v))
            .collect()
    }
}

/// Three-way result handed to the shell.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The API answered with a non-success status.
    NoData { status: u16 },
    /// Nothing to show: zero rows received, or every row was dropped.
    Empty { rows_read: usize },
    Loaded(Box<Dashboard>),
}

impl LoadOutcome {
    pub fn dashboard(&self) -> Option<&Dashboard> {
        match self {
            LoadOutcome::Loaded(d) => Some(d),
            _ => None,
        }
    }
}

/// Fetch with `filters` and run the normalization pipeline.
pub fn load<T: Transport, C: Clock>(
    client: &mut ComprasClient<T, C>,
    filters: &FilterSet,
) -> Result<LoadOutcome, AppError> {
    match client.fetch(filters)? {
        FetchOutcome::NoData { status } => Ok(LoadOutcome::NoData { status }),
        FetchOutcome::Records(table) => Ok(load_table(filters, &table)),
    }
}

/// Run the pipeline on an already-obtained table.
pub fn load_table(filters: &FilterSet, table: &RawTable) -> LoadOutcome {
    let (dataset, report) = normalize_with_report(table);
    if dataset.is_empty() {
        warn!(rows_read = report.rows_read, "no usable records after normalization");
        return LoadOutcome::Empty {
            rows_read: report.rows_read,
        };
    }
    LoadOutcome::Loaded(Box::new(Dashboard {
        filters: filters.clone(),
        dataset,
        report,
    }))
}

/// Turn a non-loaded outcome into the user-facing warning (exit code 3).
pub fn require_dashboard(outcome: LoadOutcome) -> Result<Dashboard, AppError> {
    match outcome {
        LoadOutcome::Loaded(d) => Ok(*d),
        LoadOutcome::NoData { status } => Err(AppError::new(3, no_data_message(status))),
        LoadOutcome::Empty { .. } => Err(AppError::new(3, EMPTY_MESSAGE)),
    }
}

pub const LOADED_MESSAGE: &str = "✅ Datos cargados correctamente.";

pub const EMPTY_MESSAGE: &str = "⚠️ La API no devolvió registros con esos parámetros. Prueba con otros valores (por ejemplo: Año 2022, Región vacía, Tipo Obras).";

pub fn no_data_message(status: u16) -> String {
    format!("⚠️ No se pudieron obtener datos de la API (HTTP {status}).")
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::data::{CachePolicy, FetchCache, HttpResponse, SystemClock};
    use crate::domain::Year;

    struct Canned {
        status: u16,
        body: &'static str,
        calls: Cell<usize>,
    }

    impl Transport for Canned {
        fn get(&self, _url: &str, _query: &[(&'static str, String)]) -> Result<HttpResponse, AppError> {
            self.calls.set(self.calls.get() + 1);
            Ok(HttpResponse {
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }

    fn run(status: u16, body: &'static str) -> LoadOutcome {
        let mut client = ComprasClient::with_parts(
            Canned { status, body, calls: Cell::new(0) },
            "http://localhost/api",
            FetchCache::new(SystemClock, CachePolicy::default()),
        );
        let filters = FilterSet::new(Year::new(2022).unwrap());
        load(&mut client, &filters).unwrap()
    }

    #[test]
    fn bad_status_is_no_data() {
        assert!(matches!(run(500, ""), LoadOutcome::NoData { status: 500 }));
    }

    #[test]
    fn empty_payload_and_all_dropped_are_empty() {
        assert!(matches!(run(200, "[]"), LoadOutcome::Empty { rows_read: 0 }));
        assert!(matches!(
            run(200, r#"[{"amount":"abc"},{"amount":null}]"#),
            LoadOutcome::Empty { rows_read: 2 }
        ));
    }

    #[test]
    fn loaded_dashboard_lists_available_views() {
        let out = run(200, r#"[{"type":"Licitación","amount":"10","date":"2022-05-01"}]"#);
        let dash = out.dashboard().unwrap();
        assert_eq!(dash.available_views(), View::ALL.to_vec());

        let out = run(200, r#"[{"amount":"10"}]"#);
        assert_eq!(out.dashboard().unwrap().available_views(), vec![View::Summary]);
    }

    #[test]
    fn non_loaded_outcomes_map_to_exit_code_three() {
        let err = require_dashboard(LoadOutcome::NoData { status: 404 }).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("404"));
        let err = require_dashboard(LoadOutcome::Empty { rows_read: 0 }).unwrap_err();
        assert_eq!(err.message(), EMPTY_MESSAGE);
    }
}
