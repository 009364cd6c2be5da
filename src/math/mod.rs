//! Mathematical utilities: regularised least squares and descriptive stats.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
