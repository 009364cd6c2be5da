//! Export a forecast to CSV.
//!
//! One row per period: history rows carry the observed value, forecast rows
//! carry the adjusted estimate. Easy to consume in spreadsheets.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use tracing::info;

use crate::domain::ForecastResult;
use crate::error::AppError;

/// A value written with two decimals.
#[derive(Debug, Clone, Copy)]
struct Fixed2(f64);

impl Serialize for Fixed2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{:.2}", self.0))
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum RowKind {
    History,
    Forecast,
}

#[derive(Debug, Serialize)]
struct ExportRow {
    ds: NaiveDate,
    kind: RowKind,
    y: Option<Fixed2>,
    yhat: Fixed2,
    yhat_lower: Fixed2,
    yhat_upper: Fixed2,
    yhat_final: Option<Fixed2>,
}

/// Write history and forecast rows to `path`.
pub fn write_forecast_csv(path: &Path, result: &ForecastResult) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create export CSV '{}': {e}", path.display()),
        ))
    })?;
    write_forecast_rows(file, result)?;
    info!(path = %path.display(), rows = result.history.len() + result.forecast_base.len(), "wrote forecast CSV");
    Ok(())
}

pub fn write_forecast_rows<W: Write>(out: W, result: &ForecastResult) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    for h in &result.history {
        writer.serialize(ExportRow {
            ds: h.ds,
            kind: RowKind::History,
            y: Some(Fixed2(h.y)),
            yhat: Fixed2(h.yhat),
            yhat_lower: Fixed2(h.yhat_lower),
            yhat_upper: Fixed2(h.yhat_upper),
            yhat_final: None,
        })?;
    }
    for (base, fin) in result.forecast_base.iter().zip(&result.forecast_final) {
        writer.serialize(ExportRow {
            ds: base.ds,
            kind: RowKind::Forecast,
            y: None,
            yhat: Fixed2(base.yhat),
            yhat_lower: Fixed2(base.yhat_lower),
            yhat_upper: Fixed2(base.yhat_upper),
            yhat_final: Some(Fixed2(fin.yhat_final)),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AiAdjustment, BaseForecastPoint, Cadence, FinalForecastPoint, ForecastMeta, HistoryPoint, SeasonalityMode,
    };

    fn result() -> ForecastResult {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        ForecastResult {
            meta: ForecastMeta {
                freq: Cadence::Monthly,
                train_start: d(1),
                train_end: d(1),
                cutover_date: d(2),
                horizon: 1,
                seasonality_mode: SeasonalityMode::Additive,
                holidays_used: vec![],
                original_rows: 1,
                processed_rows: 1,
                null_dates: 0,
                null_targets: 0,
            },
            ai_adjustment: AiAdjustment::not_requested(),
            history: vec![HistoryPoint {
                ds: d(1),
                y: 10.0,
                yhat: 9.5,
                yhat_lower: 8.0,
                yhat_upper: 11.0,
            }],
            forecast_base: vec![BaseForecastPoint {
                ds: d(2),
                yhat: 12.0,
                yhat_lower: 10.0,
                yhat_upper: 14.0,
            }],
            forecast_final: vec![FinalForecastPoint {
                ds: d(2),
                yhat_final: 12.0,
            }],
        }
    }

    #[test]
    fn rows_are_tagged_by_kind() {
        let mut buf = Vec::new();
        write_forecast_rows(&mut buf, &result()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ds,kind,y,yhat,yhat_lower,yhat_upper,yhat_final");
        assert_eq!(lines[1], "2024-01-01,history,10.00,9.50,8.00,11.00,");
        assert_eq!(lines[2], "2024-02-01,forecast,,12.00,10.00,14.00,12.00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn export_reads_back_as_csv() {
        let mut buf = Vec::new();
        write_forecast_rows(&mut buf, &result()).unwrap();
        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "history");
        assert_eq!(&rows[1][6], "12.00");
        assert_eq!(&rows[1][2], "");
    }
}
