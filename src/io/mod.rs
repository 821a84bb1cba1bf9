//! Input/output helpers.
//!
//! - saved-payload ingest (`ingest`)
//! - CSV export of the cleaned dataset (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
