//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - filter selections (`Year`, `Province`, `ContractType`, `FilterSet`)
//! - raw API rows (`RawValue`, `RawTable`)
//! - the cleaned dataset and its column capabilities (`CleanRecord`, `Schema`, `View`)

pub mod records;
pub mod types;

pub use records::*;
pub use types::*;
