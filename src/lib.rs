//! `compras-dash` library crate.
//!
//! The binary (`compras`) is a thin wrapper around this library so that the
//! fetch, normalization and aggregation code is testable without spawning
//! processes or a terminal.

pub mod app;
pub mod clean;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod stats;
pub mod tui;
