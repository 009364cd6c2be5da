//! Model fitting orchestration.
//!
//! Responsibilities:
//!
//! - build and solve the regularised regression for one prior scale
//! - choose the changepoint prior scale by holdout error (parallel)
//! - simulate prediction intervals

pub mod fitter;
pub mod grid;
pub mod selection;
pub mod uncertainty;

pub use fitter::*;
pub use grid::*;
pub use selection::*;
pub use uncertainty::*;
