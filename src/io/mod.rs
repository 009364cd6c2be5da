//! Input/output helpers.
//!
//! - upload checks and CSV/spreadsheet parsing (`table`)
//! - column selection, coercion and cleaning (`ingest`)
//! - forecast CSV export (`export`)

pub mod export;
pub mod ingest;
pub mod table;

pub use export::*;
pub use ingest::*;
pub use table::*;
