//! Text reports: headline metrics, summary statistics and grouped tables.

pub mod format;

pub use format::*;
