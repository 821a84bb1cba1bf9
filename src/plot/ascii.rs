//! ASCII charts for terminal output.
//!
//! Fixed-size character grids, so output is deterministic and golden-testable.
//!
//! - horizontal bars: one row per group, `#` scaled to the largest total
//! - line plot: monthly totals as `o`, joined with `.`

use crate::report::fmt_money;

/// Horizontal bar chart of labelled totals.
///
/// Bars are scaled to the largest positive total; non-positive totals get an
/// empty bar but still show their amount.
pub fn render_bar_chart(title: &str, rows: &[(String, f64)], width: usize) -> String {
    let width = width.max(5);
    let label_width = rows
        .iter()
        .map(|(l, _)| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(24);
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for (label, total) in rows {
        let len = if max > 0.0 && *total > 0.0 {
            ((total / max) * width as f64).round() as usize
        } else {
            0
        };
        let bar = "#".repeat(len.min(width));
        let label: String = label.chars().take(label_width).collect();
        out.push_str(&format!(
            "{label:<label_width$} |{bar:<width$}| {}\n",
            fmt_money(*total)
        ));
    }
    out
}

/// Line plot of `(x, y)` points in x order.
pub fn render_line_plot(title: &str, points: &[(f64, f64)], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = range(points.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let cells: Vec<(usize, usize)> = points
        .iter()
        .map(|&(x, y)| (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height)))
        .collect();
    for pair in cells.windows(2) {
        draw_line(&mut grid, pair[0], pair[1], '.');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{title}: x=[{x_min:.0}, {x_max:.0}] | total=[{}, {}]\n",
        fmt_money(y_min),
        fmt_money(y_max)
    ));
    for row in grid {
        let line: String = row.into_iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Min/max of finite values; a single value is widened by one unit each side.
fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        Some((min - 1.0, max + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // row 0 is the top (largest total)
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham); only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_golden_snapshot() {
        let rows = vec![("Obras".to_string(), 100.0), ("Bienes".to_string(), 50.0)];
        let expected = concat!(
            "Monto total por tipo\n",
            "Obras  |##########| $100.00\n",
            "Bienes |#####     | $50.00\n",
        );
        assert_eq!(render_bar_chart("Monto total por tipo", &rows, 10), expected);
    }

    #[test]
    fn bar_chart_tolerates_non_positive_totals() {
        let rows = vec![("A".to_string(), 0.0), ("B".to_string(), -5.0)];
        let txt = render_bar_chart("t", &rows, 5);
        assert!(txt.contains("A |     | $0.00"));
        assert!(txt.contains("B |     | -$5.00"));
    }

    #[test]
    fn line_plot_golden_snapshot() {
        let txt = render_line_plot("Mes", &[(1.0, 100.0), (3.0, 110.0)], 10, 5);
        let expected = concat!(
            "Mes: x=[1, 3] | total=[$99.50, $110.50]\n",
            "        .o\n",
            "      ..\n",
            "    ..\n",
            "  ..\n",
            "o.\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn single_point_plot_is_centered() {
        let txt = render_line_plot("Mes", &[(5.0, 10.0)], 11, 5);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2], "     o");
    }
}
