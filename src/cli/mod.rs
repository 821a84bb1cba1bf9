//! Command-line parsing for the procurement dashboard.
//!
//! Argument parsing and command dispatch stay separate from the fetch and
//! aggregation code: everything here ends up as a `FilterSet` plus an
//! `ApiConfig`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::data::ApiConfig;
use crate::domain::FilterSet;
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "compras", version, about = "Análisis de Compras Públicas (Ecuador)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, normalize and print metrics, statistics, tables and charts.
    Report(ReportArgs),
    /// Write the cleaned dataset to CSV.
    Export(ExportArgs),
    /// Launch the interactive dashboard (default).
    Tui(TuiArgs),
}

/// Filter selection shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct FilterArgs {
    /// Year (2015-2025).
    #[arg(short = 'y', long, default_value = "2015")]
    pub year: String,

    /// Province: API label (e.g. "EL ORO") or value name (e.g. el-oro). "Todos" for all.
    #[arg(short = 'p', long, default_value = "Todos")]
    pub province: String,

    /// Contract type: API label (e.g. "Licitación") or value name. "Todos" for all.
    #[arg(short = 't', long = "contract-type", default_value = "Todos")]
    pub contract_type: String,

    /// Free-text keyword; empty means no filter.
    #[arg(short = 'k', long, default_value = "")]
    pub keyword: String,
}

impl FilterArgs {
    pub fn to_filters(&self) -> Result<FilterSet, AppError> {
        FilterSet::from_inputs(&self.year, &self.province, &self.contract_type, &self.keyword)
    }
}

/// Connection overrides on top of `.env` / environment.
#[derive(Debug, Args, Clone, Default)]
pub struct ApiArgs {
    /// API endpoint (overrides COMPRAS_API_URL).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds (overrides COMPRAS_TIMEOUT_SECS).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Debug-level logging (RUST_LOG still wins).
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl ApiArgs {
    /// Environment config with CLI overrides applied.
    pub fn to_config(&self) -> Result<ApiConfig, AppError> {
        let mut config = ApiConfig::from_env()?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut ApiConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Some(Duration::from_secs(secs));
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Analyse a saved API response (JSON array) instead of calling the API.
    #[arg(long, value_name = "JSON")]
    pub input: Option<PathBuf>,

    /// Skip the ASCII charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Line-plot height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Analyse a saved API response (JSON array) instead of calling the API.
    #[arg(long, value_name = "JSON")]
    pub input: Option<PathBuf>,

    /// Output path (default: compras_publicas_{year}.csv).
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContractType, Province};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn report_flags_build_filters() {
        let cli = parse(&[
            "compras",
            "report",
            "--year",
            "2022",
            "--province",
            "el-oro",
            "--contract-type",
            "Licitación",
            "--keyword",
            "agua",
        ]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        let f = args.filters.to_filters().unwrap();
        assert_eq!(f.year.value(), 2022);
        assert_eq!(f.province, Some(Province::ElOro));
        assert_eq!(f.contract_type, Some(ContractType::Licitacion));
        assert_eq!(f.keyword.as_deref(), Some("agua"));
    }

    #[test]
    fn defaults_mean_no_constraint() {
        let cli = parse(&["compras", "tui"]);
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        let f = args.filters.to_filters().unwrap();
        assert_eq!(f, FilterSet::new(crate::domain::Year::first()));
    }

    #[test]
    fn bad_year_is_an_input_error() {
        let cli = parse(&["compras", "export", "--year", "1999"]);
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.filters.to_filters().unwrap_err().exit_code(), 2);
    }

    #[test]
    fn cli_overrides_apply_on_top_of_config() {
        let args = ApiArgs {
            base_url: Some("http://localhost:9/api".to_string()),
            timeout_secs: Some(5),
            verbose: false,
        };
        let mut config = ApiConfig::default();
        args.apply(&mut config);
        assert_eq!(config.base_url, "http://localhost:9/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
