//! Formatted terminal output for `--format text`.
//!
//! Formatting lives here so pipeline code stays free of presentation and
//! output changes stay localized.

use crate::domain::{ForecastResult, HolidayEvent};

/// Run summary (training window, row accounting, adjustment) plus the
/// forecast table.
pub fn format_forecast(result: &ForecastResult) -> String {
    let meta = &result.meta;
    let adj = &result.ai_adjustment;
    let mut out = String::new();

    out.push_str("=== salesforecast ===\n");
    out.push_str(&format!(
        "Cadence: {} | horizon={} | mode={:?}\n",
        meta.freq, meta.horizon, meta.seasonality_mode
    ));
    out.push_str(&format!(
        "Training: {} .. {} (cutover {})\n",
        meta.train_start, meta.train_end, meta.cutover_date
    ));
    out.push_str(&format!(
        "Rows: original={} processed={} | dropped: dates={} targets={}\n",
        meta.original_rows, meta.processed_rows, meta.null_dates, meta.null_targets
    ));
    if meta.holidays_used.is_empty() {
        out.push_str("Holidays: none\n");
    } else {
        out.push_str(&format!("Holidays: {}\n", meta.holidays_used.join(", ")));
    }

    out.push_str("\nMacro adjustment:\n");
    let status = if adj.applied { "applied" } else { "not applied" };
    out.push_str(&format!("- {:+.2}% ({status})\n", adj.adjustment_pct));
    out.push_str(&format!("- {}\n", adj.rationale));
    for source in &adj.sources {
        out.push_str(&format!("  * {source}\n"));
    }

    out.push('\n');
    out.push_str(&format_table(result));
    out
}

fn format_table(result: &ForecastResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>14} {:>14} {:>14} {:>14}\n",
        "ds", "yhat", "lower", "upper", "final"
    ));
    out.push_str(&format!("{:-<10} {:-<14} {:-<14} {:-<14} {:-<14}\n", "", "", "", "", ""));

    for (base, fin) in result.forecast_base.iter().zip(&result.forecast_final) {
        out.push_str(&format!(
            "{:<10} {:>14.2} {:>14.2} {:>14.2} {:>14.2}\n",
            base.ds, base.yhat, base.yhat_lower, base.yhat_upper, fin.yhat_final
        ));
    }
    out
}

/// One `date  name` line per holiday.
pub fn format_holidays(country: &str, events: &[HolidayEvent]) -> String {
    if events.is_empty() {
        return format!("No holidays found for '{country}'\n");
    }
    events.iter().map(|e| format!("{}  {}\n", e.date, e.name)).collect()
}
