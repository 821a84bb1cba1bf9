//! Normalization of raw API payloads into the cleaned dataset.

pub mod normalize;

pub use normalize::{NormalizeReport, normalize, normalize_with_report};
