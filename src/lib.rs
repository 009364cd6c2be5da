//! `salesforecast` library crate.
//!
//! The binary (`salesforecast`) is a thin wrapper around this library so that:
//!
//! - the forecast and adjustment operations are testable without spawning processes
//! - a host service can call [`app::pipeline`] directly with its own collaborators
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod series;
