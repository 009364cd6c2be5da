//! Raw upload parsing (CSV / spreadsheet) into a generic table.
//!
//! No type coercion happens here: cells are kept as close to the source as
//! possible and the validator decides what a date or a number is.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDateTime;
use tracing::info;

use crate::error::AppError;

/// Upload size limit (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Accepted upload extensions (lowercase, with dot).
pub const ACCEPTED_EXTENSIONS: [&str; 3] = [".csv", ".xlsx", ".xls"];

/// A single raw cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// One row, keyed by column name.
pub type RawRow = HashMap<String, RawValue>;

/// Parsed upload: ordered column names plus ordered rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    fn from_grid(header: Vec<String>, body: Vec<Vec<RawValue>>) -> Self {
        let rows = body
            .into_iter()
            .map(|cells| {
                let mut cells = cells.into_iter();
                header
                    .iter()
                    .map(|name| (name.clone(), cells.next().unwrap_or(RawValue::Empty)))
                    .collect()
            })
            .collect();
        Self { columns: header, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Spreadsheet,
}

fn file_kind(file_name: &str) -> Result<FileKind, AppError> {
    let lower = file_name.trim().to_ascii_lowercase();
    if lower.ends_with(".csv") {
        Ok(FileKind::Csv)
    } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Ok(FileKind::Spreadsheet)
    } else {
        Err(AppError::UnsupportedFile(file_name.to_string()))
    }
}

/// Reject uploads that are too large or have an unsupported extension.
pub fn check_upload(file_name: &str, size: usize) -> Result<(), AppError> {
    if file_name.trim().is_empty() {
        return Err(AppError::InvalidInput("File name is required".to_string()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::FileTooLarge {
            size_mb: size as f64 / 1024.0 / 1024.0,
        });
    }
    file_kind(file_name).map(|_| ())
}

/// Parse uploaded bytes into a `RawTable`, dispatching on the file extension.
pub fn read_table(bytes: &[u8], file_name: &str) -> Result<RawTable, AppError> {
    let table = match file_kind(file_name)? {
        FileKind::Csv => read_csv(bytes)?,
        FileKind::Spreadsheet => read_spreadsheet(bytes)?,
    };
    info!(
        file = file_name,
        rows = table.rows.len(),
        columns = table.columns.len(),
        "file loaded"
    );
    Ok(table)
}

fn read_csv(bytes: &[u8]) -> Result<RawTable, AppError> {
    let text = decode_text(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::FileRead(format!("could not read CSV header: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();

    if header.iter().all(String::is_empty) {
        return Err(AppError::FileRead("CSV file has no header row".to_string()));
    }

    let mut body = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // +2: 1-based lines, header on line 1.
        let record = record.map_err(|e| AppError::FileRead(format!("CSV parse error on line {}: {e}", idx + 2)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        body.push(
            record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        RawValue::Empty
                    } else {
                        RawValue::Text(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable::from_grid(header, body))
}

/// UTF-8 first; otherwise treat each byte as Windows-1252/Latin-1.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| cp1252_char(b)).collect(),
    }
}

fn cp1252_char(b: u8) -> char {
    const HIGH: [char; 32] = [
        '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8d}', 'Ž', '\u{8f}', '\u{90}', '‘',
        '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9d}', 'ž', 'Ÿ',
    ];
    match b {
        0x80..=0x9f => HIGH[usize::from(b - 0x80)],
        _ => char::from(b),
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet tools often prefix UTF-8 CSVs with a BOM.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::FileRead(format!("could not open spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::FileRead("spreadsheet has no worksheets".to_string()))?
        .map_err(|e| AppError::FileRead(format!("could not read first worksheet: {e}")))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .skip_while(|cells| cells.iter().all(|c| *c == RawValue::Empty));

    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| AppError::FileRead("spreadsheet is empty".to_string()))?
        .into_iter()
        .map(|cell| match cell {
            RawValue::Text(s) => normalize_header_name(&s),
            RawValue::Number(n) => n.to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::DateTime(dt) => dt.date().to_string(),
            RawValue::Empty => String::new(),
        })
        .collect();

    let body: Vec<Vec<RawValue>> = rows
        .filter(|cells| cells.iter().any(|c| *c != RawValue::Empty))
        .collect();

    Ok(RawTable::from_grid(header, body))
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Empty,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                RawValue::Empty
            } else {
                RawValue::Text(s.to_string())
            }
        }
        Data::Float(f) => RawValue::Number(*f),
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Bool(b) => RawValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(RawValue::DateTime)
            .unwrap_or(RawValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Error(_) => RawValue::Empty,
    }
}
