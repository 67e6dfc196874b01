use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::{MonthlyBucket, Transaction};

pub const DEFAULT_EXPORT_FILE: &str = "cashraaga_analysed_statement.csv";

/// Cleaned, categorized rows with columns `Date,Description,Amount,Category`.
/// `Amount` is the signed amount.
pub fn write_transactions_csv<W: Write>(writer: W, txns: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Date", "Description", "Amount", "Category"])?;
    for t in txns {
        wtr.write_record([
            t.date.format("%Y-%m-%d").to_string(),
            t.description.clone(),
            t.signed_amount.to_string(),
            t.category.label().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_monthly_csv<W: Write>(writer: W, buckets: &[MonthlyBucket]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Month", "Total Inflow", "Total Outflow", "Savings"])?;
    for b in buckets {
        wtr.write_record([
            b.month.clone(),
            b.total_inflow.to_string(),
            b.total_outflow.to_string(),
            b.savings.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_transactions(path: &Path, txns: &[Transaction]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_transactions_csv(file, txns)?;
    info!(path = %path.display(), rows = txns.len(), "wrote transactions");
    Ok(())
}

pub fn export_monthly(path: &Path, buckets: &[MonthlyBucket]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_monthly_csv(file, buckets)?;
    info!(path = %path.display(), months = buckets.len(), "wrote monthly summary");
    Ok(())
}
