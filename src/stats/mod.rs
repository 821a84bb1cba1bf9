//! Aggregate views over the cleaned dataset.
//!
//! - grouped sums and headline metrics (`aggregate`)
//! - descriptive statistics (`describe`)

pub mod aggregate;
pub mod describe;

pub use aggregate::*;
pub use describe::*;
