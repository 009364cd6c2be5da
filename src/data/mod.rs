//! External data: holiday calendars and the macro-adjustment service.

pub mod holidays;
pub mod regions;
pub mod rules;
pub mod sonar;

pub use holidays::{HolidayCalendar, RegionKey};
pub use sonar::{AdjustmentOutcome, DegradedReason, MacroAdjuster, SonarClient};
