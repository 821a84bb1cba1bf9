//! Ratatui-based terminal dashboard.
//!
//! A filter panel (year, province, contract type, keyword) drives one fetch
//! per load; the body cycles through the views the loaded dataset supports.

use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::{error, info};

use crate::app::pipeline::{self, Dashboard, LoadOutcome};
use crate::cli::TuiArgs;
use crate::data::{Clock, ComprasClient, HttpTransport, SystemClock, Transport};
use crate::domain::{ContractType, FilterSet, Province, View, cycle_selector, keyword_filter, selector_label};
use crate::error::AppError;
use crate::stats::{GroupKey, GroupSum};

mod plotters_chart;

use plotters_chart::{DashPlottersChart, Series, palette_color};

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let filters = args.filters.to_filters()?;
    let config = args.api.to_config()?;
    let client = ComprasClient::from_config(&config)?;
    let mut app = App::new(client, filters);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

const FIELD_COUNT: usize = 4;
const KEYWORD_FIELD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusKind {
    fn color(self) -> Color {
        match self {
            StatusKind::Info => Color::Gray,
            StatusKind::Success => Color::Green,
            StatusKind::Warning => Color::Yellow,
            StatusKind::Error => Color::Red,
        }
    }
}

struct App<T: Transport = HttpTransport, C: Clock = SystemClock> {
    client: ComprasClient<T, C>,
    filters: FilterSet,
    keyword_input: String,
    selected_field: usize,
    editing_keyword: bool,
    pending_load: bool,
    status: String,
    status_kind: StatusKind,
    dashboard: Option<Dashboard>,
    view_idx: usize,
    export_dir: PathBuf,
}

impl<T: Transport, C: Clock> App<T, C> {
    fn new(client: ComprasClient<T, C>, filters: FilterSet) -> Self {
        let keyword_input = filters.keyword.clone().unwrap_or_default();
        Self {
            client,
            filters,
            keyword_input,
            selected_field: 0,
            editing_keyword: false,
            pending_load: false,
            status: "Selecciona los filtros y presiona 'l' para cargar datos.".to_string(),
            status_kind: StatusKind::Info,
            dashboard: None,
            view_idx: 0,
            export_dir: PathBuf::from("."),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            // Load after the "loading" status has been drawn.
            if self.pending_load {
                self.pending_load = false;
                self.load();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_keyword {
            self.handle_keyword_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.selected_field = self.selected_field.saturating_sub(1),
            KeyCode::Down => self.selected_field = (self.selected_field + 1).min(FIELD_COUNT - 1),
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                if self.selected_field == KEYWORD_FIELD {
                    self.editing_keyword = true;
                    self.set_status(StatusKind::Info, "Editando palabra clave. Enter aplica, Esc cancela.");
                }
            }
            KeyCode::Char('l') => {
                self.pending_load = true;
                self.set_status(StatusKind::Info, "Cargando datos...");
            }
            KeyCode::Tab => self.cycle_view(1),
            KeyCode::BackTab => self.cycle_view(-1),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn handle_keyword_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_keyword = false;
                self.keyword_input = self.filters.keyword.clone().unwrap_or_default();
                self.set_status(StatusKind::Info, "Edición cancelada.");
            }
            KeyCode::Enter => {
                self.editing_keyword = false;
                self.filters.keyword = keyword_filter(&self.keyword_input);
                self.set_status(StatusKind::Info, "Palabra clave actualizada.");
            }
            KeyCode::Backspace => {
                self.keyword_input.pop();
            }
            KeyCode::Char(c) => self.keyword_input.push(c),
            _ => {}
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        let f = &mut self.filters;
        match self.selected_field {
            0 => f.year = if delta >= 0 { f.year.next() } else { f.year.prev() },
            1 => f.province = cycle_selector(&Province::ALL, f.province, delta),
            2 => f.contract_type = cycle_selector(&ContractType::ALL, f.contract_type, delta),
            _ => {}
        }
    }

    fn cycle_view(&mut self, delta: i32) {
        let Some(dash) = &self.dashboard else {
            return;
        };
        let n = dash.available_views().len() as i32;
        if n > 0 {
            self.view_idx = (self.view_idx as i32 + delta).rem_euclid(n) as usize;
        }
    }

    fn current_view(&self) -> Option<View> {
        let dash = self.dashboard.as_ref()?;
        dash.available_views().get(self.view_idx).copied()
    }

    fn load(&mut self) {
        let filters = self.filters.clone();
        match pipeline::load(&mut self.client, &filters) {
            Ok(LoadOutcome::Loaded(dash)) => {
                info!(records = dash.dataset.len(), "dashboard loaded");
                self.dashboard = Some(*dash);
                self.view_idx = 0;
                self.set_status(StatusKind::Success, pipeline::LOADED_MESSAGE);
            }
            Ok(LoadOutcome::NoData { status }) => {
                self.dashboard = None;
                self.set_status(StatusKind::Warning, pipeline::no_data_message(status));
            }
            Ok(LoadOutcome::Empty { .. }) => {
                self.dashboard = None;
                self.set_status(StatusKind::Warning, pipeline::EMPTY_MESSAGE);
            }
            Err(e) => {
                error!(error = %e, "load failed");
                self.set_status(StatusKind::Error, format!("❌ {e}"));
            }
        }
    }

    fn export(&mut self) {
        let Some(dash) = &self.dashboard else {
            self.set_status(StatusKind::Warning, "No hay datos para exportar. Presiona 'l' primero.");
            return;
        };
        let path = self.export_dir.join(crate::io::export_file_name(dash.filters.year));
        match crate::io::write_csv_file(&path, &dash.dataset) {
            Ok(()) => {
                let msg = format!("📥 CSV exportado: {}", path.display());
                self.set_status(StatusKind::Success, msg);
            }
            Err(e) => self.set_status(StatusKind::Error, format!("❌ {e}")),
        }
    }

    fn set_status(&mut self, kind: StatusKind, msg: impl Into<String>) {
        self.status_kind = kind;
        self.status = msg.into();
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(
            "Análisis de Compras Públicas (Ecuador)",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))];

        match &self.dashboard {
            Some(dash) => {
                let m = dash.dataset.metrics();
                lines.push(Line::from(format!(
                    "Total de registros: {} | Monto total: {} | Monto promedio: {}",
                    m.count,
                    crate::report::fmt_money(m.sum),
                    m.mean.map(crate::report::fmt_money).unwrap_or_else(|| "-".to_string()),
                )));
                let f = &dash.filters;
                lines.push(Line::from(Span::styled(
                    format!(
                        "Año: {} | Provincia: {} | Tipo: {} | Palabra clave: {} | recibidos: {}",
                        f.year,
                        selector_label(f.province, Province::api_name),
                        selector_label(f.contract_type, ContractType::api_name),
                        f.keyword.as_deref().unwrap_or("-"),
                        dash.report.rows_read,
                    ),
                    Style::default().fg(Color::Gray),
                )));
            }
            None => lines.push(Line::from(Span::styled("Sin datos cargados.", Style::default().fg(Color::Gray)))),
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);

        self.draw_filters(frame, chunks[0]);
        self.draw_view(frame, chunks[1]);
    }

    fn draw_filters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let f = &self.filters;
        let keyword = if self.editing_keyword {
            format!("{}_", self.keyword_input)
        } else if self.keyword_input.is_empty() {
            "-".to_string()
        } else {
            self.keyword_input.clone()
        };

        let items = vec![
            ListItem::new(format!("Año: {}", f.year)),
            ListItem::new(format!("Provincia: {}", selector_label(f.province, Province::api_name))),
            ListItem::new(format!("Tipo: {}", selector_label(f.contract_type, ContractType::api_name))),
            ListItem::new(format!("Palabra clave: {keyword}")),
        ];

        let list = List::new(items)
            .block(Block::default().title("Filtros").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_view(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (Some(dash), Some(view)) = (&self.dashboard, self.current_view()) else {
            let block = Block::default().title("Gráfico").borders(Borders::ALL);
            let msg = Paragraph::new("Esperando datos...")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let n = dash.available_views().len();
        let title = format!("{} ({}/{})", view.title(), self.view_idx + 1, n);
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let ds = &dash.dataset;
        match view {
            View::ByType => {
                if let Some(rows) = ds.sum_by_type() {
                    let data = BarData::from_groups(&rows);
                    frame.render_widget(data.widget("tipo", "total"), inner);
                }
            }
            View::ByMonth => {
                if let Some(rows) = ds.sum_by_month() {
                    let points = month_points(&rows);
                    let (x_bounds, y_bounds) = line_bounds(&points);
                    let widget = DashPlottersChart {
                        series: Series::Line(&points),
                        categories: &[],
                        x_bounds,
                        y_bounds,
                        x_label: "mes",
                        y_label: "total",
                    };
                    frame.render_widget(widget, inner);
                }
            }
            View::ByTypeAndMonth => {
                if let Some(rows) = ds.sum_by_type_and_month() {
                    draw_stacked(frame, inner, &StackedData::from_pairs(&rows), "mes");
                }
            }
            View::ByYearAndType => {
                if let Some(rows) = ds.sum_by_year_and_type() {
                    draw_stacked(frame, inner, &StackedData::from_pairs(&rows), "año");
                }
            }
            View::ProportionByType => {
                if let Some(rows) = ds.proportion_by_type() {
                    let items: Vec<ListItem> = rows
                        .iter()
                        .enumerate()
                        .map(|(i, p)| {
                            let (r, g, b) = palette_color(i);
                            ListItem::new(Line::from(vec![
                                Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))),
                                Span::raw(format!("{:<40} {:>6} {:>6.1}%", p.key.to_string(), p.count, p.share * 100.0)),
                            ]))
                        })
                        .collect();
                    frame.render_widget(List::new(items), inner);
                }
            }
            View::Summary => {
                if let Some(stats) = ds.summary_statistics() {
                    let table = crate::report::format_summary_table(&stats);
                    frame.render_widget(Paragraph::new(table), inner);
                }
            }
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ campo  ←/→ cambiar  Enter palabra clave  l cargar  Tab gráfico  e exportar  q salir";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(self.status_kind.color())),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Single-series bar chart input.
struct BarData {
    categories: Vec<String>,
    values: Vec<f64>,
    y_bounds: [f64; 2],
}

impl BarData {
    fn from_groups<K: Display>(rows: &[GroupSum<K>]) -> Self {
        let categories = rows.iter().map(|g| g.key.to_string()).collect();
        let values: Vec<f64> = rows.iter().map(|g| g.total).collect();
        let y_bounds = bar_bounds(values.iter().copied(), values.iter().copied());
        Self {
            categories,
            values,
            y_bounds,
        }
    }

    fn widget<'a>(&'a self, x_label: &'a str, y_label: &'a str) -> DashPlottersChart<'a> {
        DashPlottersChart {
            series: Series::Bars(&self.values),
            categories: &self.categories,
            x_bounds: [-0.5, self.categories.len() as f64 - 0.5],
            y_bounds: self.y_bounds,
            x_label,
            y_label,
        }
    }
}

/// Pivot of a two-key grouped sum: first key on the x axis, second key stacked.
#[derive(Debug, Clone, PartialEq)]
struct StackedData {
    categories: Vec<String>,
    layer_names: Vec<String>,
    /// `layers[j][i]`: total of layer `j` in category `i`.
    layers: Vec<Vec<f64>>,
    y_bounds: [f64; 2],
}

impl StackedData {
    fn from_pairs<A, B>(rows: &[GroupSum<(A, B)>]) -> Self
    where
        A: Ord + Clone + Display,
        B: Ord + Clone + Display,
    {
        let mut xs: Vec<A> = rows.iter().map(|g| g.key.0.clone()).collect();
        xs.sort();
        xs.dedup();
        let mut ls: Vec<B> = rows.iter().map(|g| g.key.1.clone()).collect();
        ls.sort();
        ls.dedup();

        let mut layers = vec![vec![0.0; xs.len()]; ls.len()];
        for g in rows {
            if let (Ok(i), Ok(j)) = (xs.binary_search(&g.key.0), ls.binary_search(&g.key.1)) {
                layers[j][i] += g.total;
            }
        }

        let stack_tops = (0..xs.len()).map(|i| layers.iter().map(|l| l[i].max(0.0)).sum::<f64>());
        let stack_bottoms = (0..xs.len()).map(|i| layers.iter().map(|l| l[i].min(0.0)).sum::<f64>());
        let y_bounds = bar_bounds(stack_tops, stack_bottoms);

        Self {
            categories: xs.iter().map(ToString::to_string).collect(),
            layer_names: ls.iter().map(ToString::to_string).collect(),
            layers,
            y_bounds,
        }
    }
}

fn draw_stacked(frame: &mut ratatui::Frame<'_>, area: Rect, data: &StackedData, x_label: &str) {
    let legend_height = (data.layer_names.len() as u16).min(area.height / 3).max(1);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(legend_height)])
        .split(area);

    let widget = DashPlottersChart {
        series: Series::Stacked(&data.layers),
        categories: &data.categories,
        x_bounds: [-0.5, data.categories.len() as f64 - 0.5],
        y_bounds: data.y_bounds,
        x_label,
        y_label: "total",
    };
    frame.render_widget(widget, chunks[0]);

    let legend: Vec<Line> = data
        .layer_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let (r, g, b) = palette_color(i);
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(name.clone()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(legend), chunks[1]);
}

/// Months with a known value, as `(month, total)`.
fn month_points(rows: &[GroupSum<GroupKey<u32>>]) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|g| match g.key {
            GroupKey::Value(m) => Some((m as f64, g.total)),
            GroupKey::Missing => None,
        })
        .collect()
}

fn line_bounds(points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let (mut x0, mut x1) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }
    if !x0.is_finite() || !x1.is_finite() {
        return ([1.0, 12.0], [0.0, 1.0]);
    }
    if x1 <= x0 {
        x0 -= 1.0;
        x1 += 1.0;
    }
    if y1 <= y0 {
        y0 -= 1.0;
        y1 += 1.0;
    }
    let pad = (y1 - y0) * 0.05;
    ([x0, x1], [y0 - pad, y1 + pad])
}

/// Bars start at zero; the axis covers the tallest stack and any negative totals.
fn bar_bounds(tops: impl Iterator<Item = f64>, bottoms: impl Iterator<Item = f64>) -> [f64; 2] {
    let hi = tops.fold(0.0_f64, f64::max);
    let lo = bottoms.fold(0.0_f64, f64::min);
    if hi <= lo {
        return [0.0, 1.0];
    }
    let pad = (hi - lo) * 0.05;
    [if lo < 0.0 { lo - pad } else { 0.0 }, hi + pad]
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::data::{CachePolicy, FetchCache, HttpResponse};
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

    const BODY: &str = r#"[
        {"province":"AZUAY","type":"Obras","amount":"100","date":"2022-01-10"},
        {"province":"AZUAY","type":"Bienes","amount":"50","date":"2022-02-10"},
        {"province":"LOJA","type":"Obras","amount":"25","date":"2022-02-11"}
    ]"#;

    fn app(status: u16, body: &'static str) -> App<Canned, SystemClock> {
        let client = ComprasClient::with_parts(
            Canned {
                status,
                body,
                calls: Cell::new(0),
            },
            "http://localhost/api",
            FetchCache::new(SystemClock, CachePolicy::default()),
        );
        App::new(client, FilterSet::new(Year::first()))
    }

    #[test]
    fn arrows_cycle_selectors_through_todos() {
        let mut a = app(200, "[]");
        a.handle_key(KeyCode::Left);
        assert_eq!(a.filters.year.value(), Year::MAX);

        a.handle_key(KeyCode::Down);
        a.handle_key(KeyCode::Right);
        assert_eq!(a.filters.province, Some(Province::Azuay));
        a.handle_key(KeyCode::Left);
        assert_eq!(a.filters.province, None);

        a.handle_key(KeyCode::Down);
        a.handle_key(KeyCode::Left);
        assert_eq!(a.filters.contract_type, Some(ContractType::BienesYServiciosUnicos));
    }

    #[test]
    fn keyword_edit_applies_on_enter_and_reverts_on_esc() {
        let mut a = app(200, "[]");
        a.selected_field = KEYWORD_FIELD;
        a.handle_key(KeyCode::Enter);
        assert!(a.editing_keyword);
        for c in "agua".chars() {
            a.handle_key(KeyCode::Char(c));
        }
        // 'q' while editing is text, not quit.
        assert!(!a.handle_key(KeyCode::Char('q')));
        a.handle_key(KeyCode::Backspace);
        a.handle_key(KeyCode::Enter);
        assert_eq!(a.filters.keyword.as_deref(), Some("agua"));

        a.handle_key(KeyCode::Enter);
        a.handle_key(KeyCode::Char('x'));
        a.handle_key(KeyCode::Esc);
        assert_eq!(a.keyword_input, "agua");
        assert_eq!(a.filters.keyword.as_deref(), Some("agua"));
    }

    #[test]
    fn load_success_sets_dashboard_and_views_cycle() {
        let mut a = app(200, BODY);
        assert!(!a.handle_key(KeyCode::Char('l')));
        assert!(a.pending_load);
        a.load();
        assert_eq!(a.status, pipeline::LOADED_MESSAGE);
        assert_eq!(a.status_kind, StatusKind::Success);
        assert_eq!(a.current_view(), Some(View::ByType));

        a.handle_key(KeyCode::BackTab);
        assert_eq!(a.current_view(), Some(View::Summary));
        a.handle_key(KeyCode::Tab);
        assert_eq!(a.current_view(), Some(View::ByType));
    }

    #[test]
    fn repeated_load_with_same_filters_hits_cache() {
        let mut a = app(200, BODY);
        a.load();
        a.load();
        assert_eq!(a.client.transport().calls.get(), 1);
    }

    #[test]
    fn empty_and_no_data_show_distinct_warnings() {
        let mut a = app(200, "[]");
        a.load();
        assert_eq!(a.status, pipeline::EMPTY_MESSAGE);
        assert!(a.dashboard.is_none());

        let mut a = app(503, "");
        a.load();
        assert_eq!(a.status, pipeline::no_data_message(503));
        assert_eq!(a.status_kind, StatusKind::Warning);
    }

    #[test]
    fn export_writes_csv_named_after_year() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(200, BODY);
        a.export_dir = dir.path().to_path_buf();

        a.handle_key(KeyCode::Char('e'));
        assert_eq!(a.status_kind, StatusKind::Warning);

        a.load();
        a.handle_key(KeyCode::Char('e'));
        assert_eq!(a.status_kind, StatusKind::Success);
        let path = dir.path().join("compras_publicas_2015.csv");
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn stacked_pivot_fills_missing_cells_with_zero() {
        let rows = vec![
            GroupSum { key: (1u32, "Obras".to_string()), total: 10.0 },
            GroupSum { key: (2u32, "Bienes".to_string()), total: 5.0 },
            GroupSum { key: (2u32, "Obras".to_string()), total: 7.0 },
        ];
        let data = StackedData::from_pairs(&rows);
        assert_eq!(data.categories, vec!["1", "2"]);
        assert_eq!(data.layer_names, vec!["Bienes", "Obras"]);
        assert_eq!(data.layers, vec![vec![0.0, 5.0], vec![10.0, 7.0]]);
        assert_eq!(data.y_bounds[0], 0.0);
        assert!((data.y_bounds[1] - 12.6).abs() < 1e-9);
    }

    #[test]
    fn month_points_skip_missing_month() {
        let rows = vec![
            GroupSum { key: GroupKey::Value(3), total: 1.0 },
            GroupSum { key: GroupKey::Missing, total: 9.0 },
        ];
        assert_eq!(month_points(&rows), vec![(3.0, 1.0)]);
    }

    #[test]
    fn bar_bounds_include_zero_and_negatives() {
        assert_eq!(bar_bounds([10.0].into_iter(), [10.0].into_iter()), [0.0, 10.5]);
        assert_eq!(bar_bounds([0.0].into_iter(), [-10.0].into_iter()), [-10.5, 0.5]);
        assert_eq!(bar_bounds(std::iter::empty(), std::iter::empty()), [0.0, 1.0]);
    }
}
