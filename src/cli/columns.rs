use std::path::Path;

use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::ingest::{self, preview};
use crate::mapping::sample_type_values;
use crate::models::RawTable;

const TYPE_SAMPLE_LIMIT: usize = 6;

pub fn run(file: &Path, rows: usize, type_col: Option<&str>) -> Result<()> {
    let table = ingest::read_statement(file)?;
    println!("{}", format_columns(&table, rows));
    if let Some(col) = type_col {
        let values = sample_type_values(&table, col, TYPE_SAMPLE_LIMIT)?;
        println!("{}", format_type_values(col, &values));
    }
    Ok(())
}

pub fn format_columns(table: &RawTable, rows: usize) -> String {
    let mut out = format!(
        "{} rows, {} columns: {}\n",
        table.len(),
        table.columns.len(),
        table.columns.join(", ")
    );
    let mut grid = Table::new();
    grid.set_header(table.columns.clone());
    for row in preview(table, rows) {
        grid.add_row(row.iter().map(|c| Cell::new(c.as_text())).collect::<Vec<_>>());
    }
    out.push_str(&grid.to_string());
    out
}

pub fn format_type_values(column: &str, values: &[String]) -> String {
    if values.is_empty() {
        format!("Column {column:?} has no values.")
    } else {
        format!("Sample values in {column:?}: {}", values.join(", "))
    }
}
