//! Series transformations after validation.
//!
//! - cadence resampling (`aggregate`)
//! - recent-performance features for the macro adjustment (`summary`)

pub mod aggregate;
pub mod summary;

pub use aggregate::*;
pub use summary::*;
