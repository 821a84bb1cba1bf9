//! Formatted terminal output: metrics, statistics and grouped tables.
//!
//! Output is covered by golden-string tests below.

use crate::app::pipeline::Dashboard;
use crate::domain::{ContractType, Province, View, selector_label};
use crate::stats::{ColumnSummary, Metrics};

/// `$1,234,567.89` style amount.
pub fn fmt_money(v: f64) -> String {
    let sign = if v < 0.0 { "-" } else { "" };
    let cents = (v.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{frac:02}")
}

/// Header block: filters, rows received, headline metrics.
pub fn format_run_summary(dash: &Dashboard) -> String {
    let f = &dash.filters;
    let mut out = String::new();
    out.push_str("=== Análisis de Compras Públicas (Ecuador) ===\n");
    out.push_str(&format!(
        "Año: {} | Provincia: {} | Tipo: {} | Palabra clave: {}\n",
        f.year,
        selector_label(f.province, Province::api_name),
        selector_label(f.contract_type, ContractType::api_name),
        f.keyword.as_deref().unwrap_or("-"),
    ));
    out.push_str(&format!("Total de registros obtenidos: {}\n", dash.report.rows_read));
    if dash.report.duplicates_removed > 0 || dash.report.dropped_missing_total > 0 {
        out.push_str(&format!(
            "Depuración: {} duplicados, {} sin monto\n",
            dash.report.duplicates_removed, dash.report.dropped_missing_total
        ));
    }
    out.push('\n');
    out.push_str(&format_metrics(&dash.dataset.metrics()));
    out
}

pub fn format_metrics(m: &Metrics) -> String {
    format!(
        "Total de registros: {}\nMonto total: {}\nMonto promedio: {}\n",
        m.count,
        fmt_money(m.sum),
        m.mean.map(fmt_money).unwrap_or_else(|| "-".to_string()),
    )
}

/// `describe()`-style table: one row per statistic, one column per variable.
pub fn format_summary_table(stats: &[ColumnSummary]) -> String {
    if stats.is_empty() {
        return String::new();
    }
    let width = stats
        .iter()
        .map(|s| s.column.chars().count())
        .max()
        .unwrap_or(0)
        .max(14);

    let mut out = String::new();
    let mut header = format!("{:<6}", "");
    for s in stats {
        header.push_str(&format!(" {:>width$}", s.column));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let rows: [(&str, fn(&ColumnSummary) -> Option<f64>); 8] = [
        ("count", |s| Some(s.count as f64)),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.median),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];
    for (label, get) in rows {
        let mut line = format!("{label:<6}");
        for s in stats {
            let cell = get(s).map(|v| format!("{v:.2}")).unwrap_or_else(|| "NaN".to_string());
            line.push_str(&format!(" {cell:>width$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Two-column table of labelled amounts.
pub fn format_group_table(title: &str, key_header: &str, rows: &[(String, f64)]) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push_str(":\n");
    out.push_str(&format!("{:<32} {:>18}\n", key_header, "total"));
    out.push_str(&format!("{:-<32} {:-<18}\n", "", ""));
    for (label, total) in rows {
        out.push_str(&format!("{:<32} {:>18}\n", truncate(label, 32), fmt_money(*total)));
    }
    out
}

/// Every available view as text tables.
pub fn format_views(dash: &Dashboard) -> String {
    let ds = &dash.dataset;
    let mut out = String::new();

    for view in dash.available_views() {
        let section = match view {
            View::Summary => ds
                .summary_statistics()
                .map(|s| format!("{}:\n{}", view.title(), format_summary_table(&s))),
            View::ByType => ds.sum_by_type().map(|rows| {
                let rows: Vec<_> = rows.iter().map(|g| (g.key.to_string(), g.total)).collect();
                format_group_table(view.title(), "internal_type", &rows)
            }),
            View::ByMonth => ds.sum_by_month().map(|rows| {
                let rows: Vec<_> = rows.iter().map(|g| (g.key.to_string(), g.total)).collect();
                format_group_table(view.title(), "month", &rows)
            }),
            View::ByTypeAndMonth => ds.sum_by_type_and_month().map(|rows| {
                let rows: Vec<_> = rows
                    .iter()
                    .map(|g| (format!("{} / {}", g.key.0, g.key.1), g.total))
                    .collect();
                format_group_table(view.title(), "month / internal_type", &rows)
            }),
            View::ByYearAndType => ds.sum_by_year_and_type().map(|rows| {
                let rows: Vec<_> = rows
                    .iter()
                    .map(|g| (format!("{} / {}", g.key.0, g.key.1), g.total))
                    .collect();
                format_group_table(view.title(), "year / internal_type", &rows)
            }),
            View::ProportionByType => ds.proportion_by_type().map(|rows| {
                let mut s = format!("{}:\n", view.title());
                for p in rows {
                    s.push_str(&format!(
                        "{:<32} {:>6} {:>7.1}%\n",
                        truncate(&p.key.to_string(), 32),
                        p.count,
                        p.share * 100.0
                    ));
                }
                s
            }),
        };
        if let Some(section) = section {
            out.push('\n');
            out.push_str(&section);
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::load_table;
    use crate::domain::{FilterSet, RawTable, Year};

    #[test]
    fn money_groups_thousands() {
        assert_eq!(fmt_money(0.0), "$0.00");
        assert_eq!(fmt_money(100.0), "$100.00");
        assert_eq!(fmt_money(1234567.891), "$1,234,567.89");
        assert_eq!(fmt_money(-1500.5), "-$1,500.50");
    }

    #[test]
    fn summary_golden_snapshot() {
        let raw = RawTable::from_json_str(
            r#"[{"province":"AZUAY","type":"Licitación","amount":"100","date":"2022-03-01"},
                {"province":"AZUAY","type":"Licitación","amount":"100","date":"2022-03-01"}]"#,
        )
        .unwrap();
        let filters = FilterSet::new(Year::new(2022).unwrap());
        let out = load_table(&filters, &raw);
        let dash = out.dashboard().unwrap();

        let expected = concat!(
            "=== Análisis de Compras Públicas (Ecuador) ===\n",
            "Año: 2022 | Provincia: Todos | Tipo: Todos | Palabra clave: -\n",
            "Total de registros obtenidos: 2\n",
            "Depuración: 1 duplicados, 0 sin monto\n",
            "\n",
            "Total de registros: 1\n",
            "Monto total: $100.00\n",
            "Monto promedio: $100.00\n",
        );
        assert_eq!(format_run_summary(dash), expected);
    }

    #[test]
    fn summary_table_golden_snapshot() {
        let stats = vec![ColumnSummary::from_values("total", &[1.0, 3.0])];
        let expected = concat!(
            "                total\n",
            "count            2.00\n",
            "mean             2.00\n",
            "std              1.41\n",
            "min              1.00\n",
            "25%              1.50\n",
            "50%              2.00\n",
            "75%              2.50\n",
            "max              3.00\n",
        );
        assert_eq!(format_summary_table(&stats), expected);
    }

    #[test]
    fn views_skip_unsupported_sections() {
        let raw = RawTable::from_json_str(r#"[{"amount":"10"}]"#).unwrap();
        let filters = FilterSet::new(Year::new(2022).unwrap());
        let out = load_table(&filters, &raw);
        let text = format_views(out.dashboard().unwrap());
        assert!(text.contains("Estadísticas descriptivas"));
        assert!(!text.contains("Monto total por tipo"));
        assert!(!text.contains("Evolución mensual"));
    }
}
