//! Series validation: raw table -> cleaned `(date, value)` series.
//!
//! This module is responsible for turning an arbitrary uploaded table into a
//! clean, date-sorted series that is safe to aggregate and fit.
//!
//! Design goals:
//! - **Strict schema** for the two designated columns (clear errors)
//! - **Row-level validation** (drop bad rows, but count what happened)
//! - **Deterministic behavior** (stable sort, fixed format list)
//! - **Separation of concerns**: no resampling or fitting logic here

use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::domain::{CleanedSeries, SeriesPoint};
use crate::error::AppError;
use crate::io::table::{RawTable, RawValue};

/// Minimum number of periods required to fit a forecast.
pub const MIN_PERIODS: usize = 12;

/// Validator output: cleaned series plus row accounting.
#[derive(Debug, Clone)]
pub struct ValidatedSeries {
    pub series: CleanedSeries,
    pub original_rows: usize,
    pub null_dates: usize,
    pub null_targets: usize,
}

/// Select, coerce and clean the designated date/value columns.
pub fn validate_series(table: &RawTable, date_col: &str, target_col: &str) -> Result<ValidatedSeries, AppError> {
    let date_key = resolve_column(table, date_col).ok_or_else(|| AppError::ColumnNotFound {
        role: "Date",
        column: date_col.to_string(),
    })?;
    let target_key = resolve_column(table, target_col).ok_or_else(|| AppError::ColumnNotFound {
        role: "Target",
        column: target_col.to_string(),
    })?;

    let original_rows = table.rows.len();

    // 1) Dates first; rows without a usable date never reach value parsing.
    let dated: Vec<(NaiveDate, &RawValue)> = table
        .rows
        .iter()
        .filter_map(|row| {
            let date = row.get(date_key).and_then(parse_date_value)?;
            Some((date, row.get(target_key).unwrap_or(&RawValue::Empty)))
        })
        .collect();
    let null_dates = original_rows - dated.len();
    if null_dates > 0 {
        warn!(null_dates, column = date_key, "dropping rows with invalid dates");
    }

    // 2) Values among the remaining rows.
    let points: Vec<SeriesPoint> = dated
        .iter()
        .filter_map(|(date, raw)| parse_value(raw).map(|value| SeriesPoint { date: *date, value }))
        .collect();
    let null_targets = dated.len() - points.len();
    if null_targets > 0 {
        warn!(null_targets, column = target_key, "dropping rows with invalid target values");
    }

    if points.is_empty() {
        return Err(AppError::EmptyAfterCleaning);
    }

    let series = CleanedSeries::from_points(points);
    if series.len() < MIN_PERIODS {
        return Err(AppError::InsufficientData {
            required: MIN_PERIODS,
            actual: series.len(),
        });
    }

    info!(original_rows, kept = series.len(), "series validated");

    Ok(ValidatedSeries {
        series,
        original_rows,
        null_dates,
        null_targets,
    })
}

/// Exact match first, then a trimmed case-insensitive match.
fn resolve_column<'a>(table: &'a RawTable, name: &str) -> Option<&'a str> {
    if let Some(col) = table.columns.iter().find(|c| c.as_str() == name) {
        return Some(col.as_str());
    }
    let wanted = name.trim();
    table
        .columns
        .iter()
        .find(|c| c.trim().eq_ignore_ascii_case(wanted))
        .map(String::as_str)
}

fn parse_date_value(raw: &RawValue) -> Option<NaiveDate> {
    match raw {
        RawValue::DateTime(dt) => Some(dt.date()),
        RawValue::Text(s) => parse_date(s),
        RawValue::Number(n) => excel_serial_date(*n),
        RawValue::Empty | RawValue::Bool(_) => None,
    }
}

/// Parse a textual date.
///
/// Accepts ISO dates/date-times first, then slash forms (month-first before
/// day-first), dotted day-first, compact `YYYYMMDD`, and month-only forms
/// (which resolve to the first of the month).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 9] = [
        "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y%m%d", "%d %b %Y", "%b %d, %Y",
    ];
    const DATETIME_FMTS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M",
    ];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // Month-only forms: "2024-03", "2024/03", "Mar 2024", "March 2024".
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d %B %Y"] {
        let candidate = match fmt {
            "%Y-%m-%d" => format!("{s}-01"),
            "%Y/%m/%d" => format!("{s}/01"),
            _ => format!("01 {s}"),
        };
        if let Ok(d) = NaiveDate::parse_from_str(&candidate, fmt) {
            return Some(d);
        }
    }

    None
}

/// Spreadsheet serial day numbers (1900 date system).
fn excel_serial_date(n: f64) -> Option<NaiveDate> {
    // 2_958_465 is 9999-12-31.
    if !n.is_finite() || !(1.0..2_958_466.0).contains(&n) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(n.trunc() as u64))
}

fn parse_value(raw: &RawValue) -> Option<f64> {
    match raw {
        RawValue::Number(n) if n.is_finite() => Some(*n),
        RawValue::Text(s) => parse_number(s),
        _ => None,
    }
}

/// Parse a finite number, allowing `1,234,567.8` style grouping.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned = if s.contains(',') {
        if !is_grouped_number(s) {
            return None;
        }
        s.replace(',', "")
    } else {
        s.to_string()
    };
    let v = cleaned.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn is_grouped_number(s: &str) -> bool {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let int_part = unsigned.split('.').next().unwrap_or("");
    let mut groups = int_part.split(',');
    let Some(first) = groups.next() else { return false };
    if first.is_empty() || first.len() > 3 || !first.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::table::read_table;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn monthly_csv(n: usize, bad_values: &[usize]) -> String {
        let mut out = String::from("Month,Revenue\n");
        for i in 0..n {
            let date = d(2022, 1, 1).checked_add_months(chrono::Months::new(i as u32)).unwrap();
            if bad_values.contains(&i) {
                out.push_str(&format!("{date},n/a\n"));
            } else {
                out.push_str(&format!("{date},{}\n", 100 + i));
            }
        }
        out
    }

    #[test]
    fn parses_common_date_formats() {
        assert_eq!(parse_date("2024-03-05"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("03/05/2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("25/12/2024"), Some(d(2024, 12, 25)));
        assert_eq!(parse_date("2024-03-05 13:45:00"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T13:45:00Z"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024-03"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("Mar 2024"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn parses_numbers_strictly() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("-1,000"), Some(-1000.0));
        assert_eq!(parse_number("1,23"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn spreadsheet_serials_map_to_dates() {
        assert_eq!(excel_serial_date(45292.0), Some(d(2024, 1, 1)));
        assert_eq!(excel_serial_date(-3.0), None);
    }

    #[test]
    fn missing_columns_are_reported_by_role() {
        let table = read_table(monthly_csv(12, &[]).as_bytes(), "x.csv").unwrap();
        let err = validate_series(&table, "date", "Revenue").unwrap_err();
        assert!(matches!(err, AppError::ColumnNotFound { role: "Date", .. }));
        let err = validate_series(&table, "Month", "sales").unwrap_err();
        assert!(matches!(err, AppError::ColumnNotFound { role: "Target", .. }));
    }

    #[test]
    fn column_names_match_case_insensitively() {
        let table = read_table(monthly_csv(12, &[]).as_bytes(), "x.csv").unwrap();
        let v = validate_series(&table, "month", " revenue ").unwrap();
        assert_eq!(v.series.len(), 12);
    }

    #[test]
    fn bad_values_are_counted_and_dropped() {
        let table = read_table(monthly_csv(24, &[3, 9, 17]).as_bytes(), "x.csv").unwrap();
        let v = validate_series(&table, "Month", "Revenue").unwrap();
        assert_eq!(v.original_rows, 24);
        assert_eq!(v.null_dates, 0);
        assert_eq!(v.null_targets, 3);
        assert_eq!(v.series.len(), 21);
    }

    #[test]
    fn bad_dates_are_counted_before_values() {
        let csv = "when,qty\nyesterday,n/a\n2024-01-01,5\n";
        let table = read_table(csv.as_bytes(), "x.csv").unwrap();
        let err = validate_series(&table, "when", "qty").unwrap_err();
        assert!(matches!(err, AppError::InsufficientData { actual: 1, .. }));
    }

    #[test]
    fn empty_after_cleaning_is_an_error() {
        let csv = "when,qty\nx,1\n2024-01-01,oops\n";
        let table = read_table(csv.as_bytes(), "x.csv").unwrap();
        assert!(matches!(
            validate_series(&table, "when", "qty"),
            Err(AppError::EmptyAfterCleaning)
        ));
    }

    #[test]
    fn eleven_rows_are_insufficient_twelve_are_enough() {
        let table = read_table(monthly_csv(11, &[]).as_bytes(), "x.csv").unwrap();
        assert!(matches!(
            validate_series(&table, "Month", "Revenue"),
            Err(AppError::InsufficientData { required: 12, actual: 11 })
        ));
        let table = read_table(monthly_csv(12, &[]).as_bytes(), "x.csv").unwrap();
        assert!(validate_series(&table, "Month", "Revenue").is_ok());
    }

    #[test]
    fn output_is_sorted_by_date() {
        let mut csv = String::from("ds,y\n");
        for i in (0..12).rev() {
            csv.push_str(&format!("2024-01-{:02},{i}\n", i + 1));
        }
        let table = read_table(csv.as_bytes(), "x.csv").unwrap();
        let v = validate_series(&table, "ds", "y").unwrap();
        let dates = v.series.dates();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(v.series.points()[0].value, 0.0);
    }
}
