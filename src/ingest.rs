use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::error::{CashError, Result};
use crate::models::{RawCell, RawTable};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert an Excel serial day number (fraction = time of day) to a datetime.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // 2958465 is 9999-12-31, the last day Excel can represent
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let secs = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    base.checked_add_signed(chrono::Duration::days(days))?
        .checked_add_signed(chrono::Duration::seconds(secs))
}

/// Make header names unique and non-blank, pandas style:
/// blanks become `Unnamed: <i>`, repeats get `.1`, `.2`, ...
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let name = name.trim_start_matches('\u{feff}').trim().to_string();
        let base = if name.is_empty() {
            format!("Unnamed: {i}")
        } else {
            name
        };
        let count = seen.entry(base.clone()).or_insert(0);
        let unique = if *count == 0 {
            base.clone()
        } else {
            format!("{base}.{count}")
        };
        *count += 1;
        out.push(unique);
    }
    out
}

fn text_cell(raw: &str) -> RawCell {
    if raw.trim().is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(raw.to_string())
    }
}

/// First `n` rows, for showing the user what the columns hold before mapping.
pub fn preview(table: &RawTable, n: usize) -> &[Vec<RawCell>] {
    &table.rows[..n.min(table.rows.len())]
}

// ---------------------------------------------------------------------------
// Statement kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatementKind {
    Csv,
    #[cfg(feature = "excel")]
    Workbook,
}

impl StatementKind {
    pub fn for_path(file_path: &Path) -> Result<Self> {
        let is_csv = file_path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            return Ok(Self::Csv);
        }
        #[cfg(feature = "excel")]
        {
            Ok(Self::Workbook)
        }
        #[cfg(not(feature = "excel"))]
        {
            Err(CashError::UnsupportedFile(file_path.display().to_string()))
        }
    }

    pub fn read(&self, file_path: &Path) -> Result<RawTable> {
        match self {
            Self::Csv => {
                let file = std::fs::File::open(file_path)?;
                read_csv(std::io::BufReader::new(file))
            }
            #[cfg(feature = "excel")]
            Self::Workbook => read_workbook(file_path),
        }
    }
}

/// Load a statement file into a raw table. A file with a header but no data
/// rows is an ingestion failure.
pub fn read_statement(file_path: &Path) -> Result<RawTable> {
    let kind = StatementKind::for_path(file_path)?;
    debug!(path = %file_path.display(), ?kind, "reading statement");
    let table = kind.read(file_path)?;
    if table.is_empty() {
        return Err(CashError::EmptyStatement);
    }
    info!(
        rows = table.len(),
        columns = table.columns.len(),
        "statement loaded"
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn read_csv<R: std::io::Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CashError::EmptyStatement);
    }
    let columns = normalize_headers(headers);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let mut row: Vec<RawCell> = record.iter().map(text_cell).collect();
        row.resize(columns.len(), RawCell::Empty);
        rows.push(row);
    }
    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// Workbook (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "excel")]
fn workbook_cell(data: &calamine::Data) -> RawCell {
    use calamine::Data;
    match data {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => text_cell(s),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(RawCell::DateTime)
            .unwrap_or(RawCell::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
    }
}

#[cfg(feature = "excel")]
fn read_workbook(file_path: &Path) -> Result<RawTable> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| CashError::Excel(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(CashError::EmptyStatement)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| CashError::Excel(e.to_string()))?;

    let mut iter = range.rows();
    let Some(header) = iter.next() else {
        return Err(CashError::EmptyStatement);
    };
    let columns = normalize_headers(header.iter().map(|c| c.to_string()).collect());

    let mut rows = Vec::new();
    for row in iter {
        let mut cells: Vec<RawCell> = row.iter().map(workbook_cell).collect();
        if cells.iter().all(RawCell::is_empty) {
            continue;
        }
        cells.resize(columns.len(), RawCell::Empty);
        rows.push(cells);
    }
    debug!(sheet = %sheet, rows = rows.len(), "workbook sheet read");
    Ok(RawTable { columns, rows })
}
