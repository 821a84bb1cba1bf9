//! Terminal charts for the `report` command.

pub mod ascii;

pub use ascii::{render_bar_chart, render_line_plot};
