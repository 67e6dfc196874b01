use std::path::{Path, PathBuf};

use crate::cli::{run_analysis, StatementArgs};
use crate::error::Result;
use crate::export::{export_monthly, export_transactions, DEFAULT_EXPORT_FILE};

pub fn run(input: &StatementArgs, output: Option<&Path>, monthly: bool) -> Result<()> {
    let (_, analysis) = run_analysis(input)?;
    let path = output.map_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE), Path::to_path_buf);
    if monthly {
        export_monthly(&path, &analysis.monthly)?;
        println!("Wrote {} months to {}", analysis.monthly.len(), path.display());
    } else {
        export_transactions(&path, &analysis.transactions)?;
        println!(
            "Wrote {} transactions to {}",
            analysis.transactions.len(),
            path.display()
        );
    }
    Ok(())
}
