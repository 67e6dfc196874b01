use crate::cli::report::{
    format_categories, format_emi, format_forecast, format_monthly, format_overview,
    format_recent, format_upi, RECENT_ROWS,
};
use crate::cli::{run_analysis, StatementArgs};
use crate::error::{CashError, Result};
use crate::pipeline::Analysis;

pub fn run(input: &StatementArgs, json: bool) -> Result<()> {
    let (settings, analysis) = run_analysis(input)?;
    if json {
        let out = serde_json::to_string_pretty(&analysis)
            .map_err(|e| CashError::Other(e.to_string()))?;
        println!("{out}");
    } else {
        println!("{}", format_full(&analysis, &settings.currency_symbol));
    }
    Ok(())
}

/// Every report section, in dashboard order.
pub fn format_full(analysis: &Analysis, symbol: &str) -> String {
    [
        format_overview(analysis, symbol),
        format_categories(&analysis.categories, symbol),
        format_monthly(&analysis.monthly, symbol),
        format_upi(&analysis.upi, symbol),
        format_emi(&analysis.emi, symbol),
        format_recent(&analysis.recent(RECENT_ROWS), symbol),
        format_forecast(&analysis.forecast, symbol),
    ]
    .join("\n\n")
}
