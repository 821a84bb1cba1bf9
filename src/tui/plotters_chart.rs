//! Plotters-powered dashboard chart widget for Ratatui.
//!
//! Plotters draws the axes and tick labels; `plotters-ratatui-backend` writes
//! the result into the Ratatui buffer.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Series palette, shared with the legend drawn next to stacked charts.
pub const PALETTE: [(u8, u8, u8); 8] = [
    (0, 255, 255),
    (255, 200, 0),
    (0, 255, 0),
    (255, 80, 80),
    (180, 120, 255),
    (255, 255, 255),
    (255, 140, 0),
    (80, 160, 255),
];

pub fn palette_color(idx: usize) -> (u8, u8, u8) {
    PALETTE[idx % PALETTE.len()]
}

/// What to draw.
#[derive(Clone, Copy)]
pub enum Series<'a> {
    /// One bar per category.
    Bars(&'a [f64]),
    /// One layer per group, each with one value per category, stacked bottom-up.
    Stacked(&'a [Vec<f64>]),
    /// Connected `(x, y)` points.
    Line(&'a [(f64, f64)]),
}

/// Render-only chart description. All series and bounds are computed outside
/// the render call.
pub struct DashPlottersChart<'a> {
    pub series: Series<'a>,
    /// Tick labels for bar charts (category `i` sits at `x = i`).
    pub categories: &'a [String],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl Widget for DashPlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Área de gráfico muy pequeña (redimensiona la terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let categories = self.categories;
        let x_fmt = move |v: &f64| -> String {
            if categories.is_empty() {
                return format!("{v:.0}");
            }
            let idx = v.round();
            if (v - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            categories
                .get(idx as usize)
                .map(|c| c.chars().take(10).collect())
                .unwrap_or_default()
        };
        let x_ticks = if categories.is_empty() { 6 } else { categories.len().max(2) };

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(x_ticks)
                .y_labels(5)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&|v| compact_amount(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            match self.series {
                Series::Bars(values) => {
                    let (r, g, b) = palette_color(0);
                    let color = RGBColor(r, g, b);
                    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
                        let x = i as f64;
                        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, v)], color.filled())
                    }))?;
                }
                Series::Stacked(layers) => {
                    let n = layers.first().map(Vec::len).unwrap_or(0);
                    let mut base = vec![0.0_f64; n];
                    for (layer_idx, layer) in layers.iter().enumerate() {
                        let (r, g, b) = palette_color(layer_idx);
                        let color = RGBColor(r, g, b);
                        let mut rects = Vec::with_capacity(n);
                        for (i, &v) in layer.iter().enumerate().take(n) {
                            if v == 0.0 {
                                continue;
                            }
                            let x = i as f64;
                            rects.push(Rectangle::new(
                                [(x - 0.35, base[i]), (x + 0.35, base[i] + v)],
                                color.filled(),
                            ));
                            base[i] += v;
                        }
                        chart.draw_series(rects)?;
                    }
                }
                Series::Line(points) => {
                    let (r, g, b) = palette_color(0);
                    let color = RGBColor(r, g, b);
                    chart.draw_series(LineSeries::new(points.iter().copied(), &color))?;
                    // Pixel markers; the backend scales circle radii badly.
                    chart.draw_series(points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Short axis label for large amounts (`1.2M`, `350k`).
pub fn compact_amount(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.0}k", v / 1e3)
    } else {
        format!("{v:.0}")
    }
}
