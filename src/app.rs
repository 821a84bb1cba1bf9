//! Top-level application orchestration.
//!
//! `src/main.rs` only maps the result to an exit code; this module:
//! - parses CLI arguments
//! - sets up logging
//! - loads data (API or saved payload) through the shared pipeline
//! - prints reports/charts or writes the CSV export

use std::path::Path;

use clap::Parser;
use tracing::info;

use crate::cli::{ApiArgs, Command, ExportArgs, ReportArgs, TuiArgs};
use crate::data::ComprasClient;
use crate::domain::{FilterSet, View};
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::stats::GroupKey;

pub mod pipeline;

use pipeline::{Dashboard, LoadOutcome};

/// Entry point for the `compras` binary.
pub fn run() -> Result<(), AppError> {
    // `compras` and `compras --year 2022` behave like `compras tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Export(args) => handle_export(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    logging::init(LogTarget::Stderr, args.api.verbose)?;
    let filters = args.filters.to_filters()?;
    let outcome = load_outcome(&filters, &args.api, args.input.as_deref())?;
    let dash = pipeline::require_dashboard(outcome)?;

    println!("{}", pipeline::LOADED_MESSAGE);
    println!("{}", crate::report::format_run_summary(&dash));
    println!("{}", crate::report::format_views(&dash));

    if !args.no_plot {
        let charts = render_charts(&dash, args.width, args.height);
        if !charts.is_empty() {
            println!("{charts}");
        }
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    logging::init(LogTarget::Stderr, args.api.verbose)?;
    let filters = args.filters.to_filters()?;
    let outcome = load_outcome(&filters, &args.api, args.input.as_deref())?;
    let dash = pipeline::require_dashboard(outcome)?;

    let path = args
        .out
        .unwrap_or_else(|| crate::io::export_file_name(filters.year));
    crate::io::write_csv_file(&path, &dash.dataset)?;
    println!("📥 {} registros exportados a {}", dash.dataset.len(), path.display());
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    logging::init(LogTarget::File(Path::new(logging::TUI_LOG_FILE)), args.api.verbose)?;
    crate::tui::run(args)
}

/// Saved payload when `input` is given, otherwise one API fetch.
fn load_outcome(filters: &FilterSet, api: &ApiArgs, input: Option<&Path>) -> Result<LoadOutcome, AppError> {
    match input {
        Some(path) => {
            let table = crate::io::read_raw_json(path)?;
            Ok(pipeline::load_table(filters, &table))
        }
        None => {
            let config = api.to_config()?;
            info!(base_url = %config.base_url, "using procurement API");
            let mut client = ComprasClient::from_config(&config)?;
            pipeline::load(&mut client, filters)
        }
    }
}

/// ASCII charts for the type and monthly views, when available.
pub fn render_charts(dash: &Dashboard, width: usize, height: usize) -> String {
    let mut out = String::new();

    if let Some(rows) = dash.dataset.sum_by_type() {
        let rows: Vec<(String, f64)> = rows.iter().map(|g| (g.key.to_string(), g.total)).collect();
        out.push_str(&crate::plot::render_bar_chart(View::ByType.title(), &rows, width));
    }

    if let Some(rows) = dash.dataset.sum_by_month() {
        let points: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|g| match g.key {
                GroupKey::Value(m) => Some((m as f64, g.total)),
                GroupKey::Missing => None,
            })
            .collect();
        if !points.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&crate::plot::render_line_plot(
                View::ByMonth.title(),
                &points,
                width,
                height,
            ));
        }
    }
    out
}

/// Rewrite argv so `compras` defaults to `compras tui`.
///
/// Rules:
/// - `compras`                      -> `compras tui`
/// - `compras --year 2022 ...`      -> `compras tui --year 2022 ...`
/// - `compras --help/--version/-h`  -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
