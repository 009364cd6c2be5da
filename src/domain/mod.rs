//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the cadence enum and its calendar arithmetic (`Cadence`)
//! - the cleaned series and derived features (`CleanedSeries`, `RecentSummary`)
//! - model outputs and the serialized forecast/adjustment results

pub mod types;

pub use types::*;
