use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CashError, Result};
use crate::ingest::excel_serial_to_datetime;
use crate::mapping::{normalize_token, ResolvedMapping, ResolvedTypeColumn};
use crate::models::{RawCell, RawTable};

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Numeric coercion: numbers pass through, text must parse as a float.
/// Anything else, or a non-finite result, is `None`.
pub fn coerce_amount(cell: &RawCell) -> Option<f64> {
    let value = match cell {
        RawCell::Number(n) => *n,
        RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
        RawCell::Empty | RawCell::Bool(_) | RawCell::DateTime(_) => return None,
    };
    value.is_finite().then_some(value)
}

pub fn coerce_date(cell: &RawCell, day_first: bool) -> Option<NaiveDate> {
    match cell {
        RawCell::DateTime(dt) => Some(dt.date()),
        RawCell::Number(n) if *n >= 1.0 => excel_serial_to_datetime(*n).map(|dt| dt.date()),
        RawCell::Text(s) => parse_date(s, day_first),
        _ => None,
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const MONTH_NAME_FORMATS: &[&str] = &[
    "%d-%B-%Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d/%B/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%A, %B %d, %Y",
    "%A, %d %B %Y",
];

const MONTH_NAME_SHORT_YEAR_FORMATS: &[&str] = &["%d-%B-%y", "%d %B %y", "%d/%B/%y"];

/// Parse a statement date, discarding any time of day.
///
/// Numeric dates like `05/01/2024` are read month-first unless `day_first`
/// is set; when the preferred reading is impossible the other one is tried.
pub fn parse_date(raw: &str, day_first: bool) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    parse_date_only(s, day_first).or_else(|| {
        let head = strip_time_of_day(s)?;
        parse_date_only(head, day_first)
    })
}

/// `"05/01/2024 10:30 AM"` -> `"05/01/2024"`.
fn strip_time_of_day(s: &str) -> Option<&str> {
    let colon = s.find(':')?;
    let start = s[..colon].rfind([' ', 'T'])?;
    let head = s[..start].trim_end();
    (!head.is_empty()).then_some(head)
}

fn parse_date_only(s: &str, day_first: bool) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return ymd(s[0..4].parse().ok()?, s[4..6].parse().ok()?, s[6..8].parse().ok()?);
    }
    if let Some(date) = parse_numeric_date(s, day_first) {
        return Some(date);
    }
    let short_year = s
        .rsplit([' ', '-', '/', ','])
        .next()
        .is_some_and(|t| t.len() == 2 && t.bytes().all(|b| b.is_ascii_digit()));
    let formats = if short_year {
        MONTH_NAME_SHORT_YEAR_FORMATS
    } else {
        MONTH_NAME_FORMATS
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// `2024-01-05`, `2024/1/5`, `05/01/2024`, `5-1-24`, `05.01.2024`.
fn parse_numeric_date(s: &str, day_first: bool) -> Option<NaiveDate> {
    let sep = s.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    if parts[0].len() == 4 {
        return ymd(parts[0].parse().ok()?, parts[1].parse().ok()?, parts[2].parse().ok()?);
    }
    let year: i32 = match parts[2].len() {
        4 => parts[2].parse().ok()?,
        // Two-digit years follow the strftime %y pivot: 69-99 -> 19xx, else 20xx.
        2 => {
            let yy: i32 = parts[2].parse().ok()?;
            if yy >= 69 {
                1900 + yy
            } else {
                2000 + yy
            }
        }
        _ => return None,
    };
    let a: u32 = parts[0].parse().ok()?;
    let b: u32 = parts[1].parse().ok()?;
    if day_first {
        ymd(year, b, a).or_else(|| ymd(year, a, b))
    } else {
        ymd(year, a, b).or_else(|| ymd(year, b, a))
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// How `signed_amount` was derived for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignSource {
    /// The amount column's own sign was trusted.
    AmountSign,
    /// Unsigned magnitudes were signed from the Credit/Debit column.
    TypeColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub signed_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizeStats {
    pub input_rows: usize,
    pub dropped_amount: usize,
    pub dropped_date: usize,
    /// Rows kept with a zero signed amount because their type value matched
    /// neither token. They count toward neither inflow nor outflow.
    pub zero_signed: usize,
    pub sign_source: SignSource,
}

impl NormalizeStats {
    pub fn kept(&self) -> usize {
        self.input_rows - self.dropped_amount - self.dropped_date
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub rows: Vec<NormalizedRow>,
    pub stats: NormalizeStats,
}

fn type_flags(cell: &RawCell, tc: &ResolvedTypeColumn) -> (bool, bool) {
    if cell.is_empty() {
        return (false, false);
    }
    let value = normalize_token(&cell.as_text());
    (value == tc.credit_token, value == tc.debit_token)
}

/// Coerce amounts and dates, dropping rows where either fails, and derive
/// the signed amount.
///
/// With a type column configured, the sign comes from the type tokens only
/// when every parsed amount is non-negative; otherwise the amounts are
/// already signed and the type column is ignored. The minimum is taken
/// before date coercion drops anything.
pub fn normalize(table: &RawTable, mapping: &ResolvedMapping, day_first: bool) -> Result<Normalized> {
    let input_rows = table.len();

    let mut with_amount: Vec<(usize, f64)> = Vec::with_capacity(input_rows);
    for row in 0..input_rows {
        match coerce_amount(table.cell(row, mapping.amount)) {
            Some(amount) => with_amount.push((row, amount)),
            None => debug!(row, "dropping row: amount is not numeric"),
        }
    }
    let dropped_amount = input_rows - with_amount.len();

    let sign_by_type = match &mapping.type_column {
        Some(tc) => {
            let min = with_amount.iter().map(|(_, a)| *a).fold(f64::INFINITY, f64::min);
            (min >= 0.0).then_some(tc)
        }
        None => None,
    };
    let sign_source = if sign_by_type.is_some() {
        SignSource::TypeColumn
    } else {
        SignSource::AmountSign
    };
    debug!(?sign_source, "sign convention chosen");

    let mut rows = Vec::with_capacity(with_amount.len());
    let mut dropped_date = 0usize;
    let mut zero_signed = 0usize;
    for (row, amount) in with_amount {
        let Some(date) = coerce_date(table.cell(row, mapping.date), day_first) else {
            debug!(row, "dropping row: date did not parse");
            dropped_date += 1;
            continue;
        };
        let signed_amount = match sign_by_type {
            Some(tc) => match type_flags(table.cell(row, tc.index), tc) {
                (true, _) => amount,
                (false, true) => -amount,
                (false, false) => {
                    zero_signed += 1;
                    0.0
                }
            },
            None => amount,
        };
        rows.push(NormalizedRow {
            date,
            description: table.cell(row, mapping.description).as_text(),
            amount,
            signed_amount,
        });
    }

    if rows.is_empty() {
        return Err(CashError::NoValidRows);
    }
    if zero_signed > 0 {
        warn!(
            zero_signed,
            "rows matched neither the credit nor the debit token and were counted as zero"
        );
    }
    if dropped_amount + dropped_date > 0 {
        debug!(dropped_amount, dropped_date, kept = rows.len(), "rows excluded during cleaning");
    }

    Ok(Normalized {
        rows,
        stats: NormalizeStats {
            input_rows,
            dropped_amount,
            dropped_date,
            zero_signed,
            sign_source,
        },
    })
}
