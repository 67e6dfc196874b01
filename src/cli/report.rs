use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregator::{CategorySpend, DescriptionTotal, EmiSummary, Totals, UpiSummary};
use crate::cli::{run_analysis, ReportCommands};
use crate::error::Result;
use crate::fmt::{money, signed_money, wrap};
use crate::forecast::ForecastResult;
use crate::models::{MonthlyBucket, Transaction};
use crate::normalizer::{NormalizeStats, SignSource};
use crate::pipeline::Analysis;

const DESCRIPTION_WIDTH: usize = 40;
pub const RECENT_ROWS: usize = 10;

pub fn run(command: &ReportCommands) -> Result<()> {
    let input = match command {
        ReportCommands::Overview(input)
        | ReportCommands::Monthly(input)
        | ReportCommands::Categories(input)
        | ReportCommands::Upi(input)
        | ReportCommands::Emi(input)
        | ReportCommands::Forecast(input) => input,
    };
    let (settings, a) = run_analysis(input)?;
    let symbol = settings.currency_symbol.as_str();
    let out = match command {
        ReportCommands::Overview(_) => format_overview(&a, symbol),
        ReportCommands::Monthly(_) => format_monthly(&a.monthly, symbol),
        ReportCommands::Categories(_) => format_categories(&a.categories, symbol),
        ReportCommands::Upi(_) => format_upi(&a.upi, symbol),
        ReportCommands::Emi(_) => format_emi(&a.emi, symbol),
        ReportCommands::Forecast(_) => format_forecast(&a.forecast, symbol),
    };
    println!("{out}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting functions (analysis → String)
// ---------------------------------------------------------------------------

fn amount_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn savings_text(val: f64, symbol: &str) -> String {
    let text = money(val, symbol);
    if val >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

pub fn format_overview(analysis: &Analysis, symbol: &str) -> String {
    let mut out = String::from("Statement Overview\n");
    out.push_str(&format_totals(&analysis.totals, analysis.monthly.len(), symbol));
    out.push('\n');
    out.push_str(&format_cleaning(&analysis.stats));
    out
}

pub fn format_totals(totals: &Totals, months: usize, symbol: &str) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Total Inflow"), amount_cell(money(totals.inflow, symbol))]);
    table.add_row(vec![Cell::new("Total Outflow"), amount_cell(money(totals.outflow, symbol))]);
    table.add_row(vec![
        Cell::new("Net Savings".bold()),
        amount_cell(savings_text(totals.savings, symbol)),
    ]);
    table.add_row(vec![Cell::new("Months"), amount_cell(months.to_string())]);
    table.to_string()
}

pub fn format_cleaning(stats: &NormalizeStats) -> String {
    let mut lines = vec![format!(
        "{} of {} rows kept ({} without a numeric amount, {} without a valid date).",
        stats.kept(),
        stats.input_rows,
        stats.dropped_amount,
        stats.dropped_date
    )];
    lines.push(match stats.sign_source {
        SignSource::AmountSign => "Signs taken from the amount column.".to_string(),
        SignSource::TypeColumn => "Signs taken from the Credit/Debit column.".to_string(),
    });
    if stats.zero_signed > 0 {
        lines.push(
            format!(
                "Warning: {} rows matched neither the credit nor the debit value and count as zero.",
                stats.zero_signed
            )
            .yellow()
            .to_string(),
        );
    }
    lines.join("\n")
}

pub fn format_monthly(buckets: &[MonthlyBucket], symbol: &str) -> String {
    if buckets.is_empty() {
        return "No monthly activity.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Month", "Inflow", "Outflow", "Savings"]);
    for b in buckets {
        table.add_row(vec![
            Cell::new(&b.month),
            amount_cell(money(b.total_inflow, symbol)),
            amount_cell(money(b.total_outflow, symbol)),
            amount_cell(savings_text(b.savings, symbol)),
        ]);
    }
    format!("Monthly Savings\n{table}")
}

pub fn format_categories(categories: &[CategorySpend], symbol: &str) -> String {
    if categories.is_empty() {
        return "No spending found.".to_string();
    }
    let grand_total: f64 = categories.iter().map(|c| c.total).sum();
    let mut table = Table::new();
    table.set_header(vec!["Category", "Spend", "Txns", "Share"]);
    for c in categories {
        let share = if grand_total > 0.0 {
            c.total / grand_total * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(c.category.label()),
            amount_cell(money(c.total, symbol)),
            amount_cell(c.count.to_string()),
            amount_cell(format!("{share:.1}%")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        amount_cell(money(grand_total, symbol)),
        Cell::new(""),
        Cell::new(""),
    ]);
    format!("Spend by Category\n{table}")
}

fn format_top(rows: &[DescriptionTotal], symbol: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Description", "Amount"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(wrap(&r.description, DESCRIPTION_WIDTH)),
            amount_cell(money(r.total, symbol)),
        ]);
    }
    table
}

pub fn format_upi(upi: &UpiSummary, symbol: &str) -> String {
    if upi.is_empty() {
        return "No UPI transactions found.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["UPI", "Value"]);
    table.add_row(vec![Cell::new("Transactions"), amount_cell(upi.transactions.len().to_string())]);
    table.add_row(vec![Cell::new("Inflow"), amount_cell(money(upi.inflow, symbol))]);
    table.add_row(vec![Cell::new("Outflow"), amount_cell(money(upi.outflow, symbol))]);
    table.add_row(vec![Cell::new("Net".bold()), amount_cell(savings_text(upi.net, symbol))]);
    format!(
        "UPI Activity\n{table}\nTop UPI Counterparties\n{}",
        format_top(&upi.top_counterparties, symbol)
    )
}

pub fn format_emi(emi: &EmiSummary, symbol: &str) -> String {
    if emi.is_empty() {
        return "No EMI or loan debits found.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Month", "EMI Outflow"]);
    for m in &emi.monthly {
        table.add_row(vec![Cell::new(&m.month), amount_cell(money(m.total, symbol))]);
    }
    format!(
        "EMI & Loans\nTotal EMI outflow: {}\nAverage per month: {}\n{table}\nTop EMI Sources\n{}",
        money(emi.total_outflow, symbol),
        money(emi.average_monthly, symbol),
        format_top(&emi.top_sources, symbol)
    )
}

pub fn format_forecast(forecast: &ForecastResult, symbol: &str) -> String {
    let f = match forecast {
        ForecastResult::Available(f) => f,
        other => {
            return other
                .unavailable_reason()
                .unwrap_or_default()
                .yellow()
                .to_string()
        }
    };
    let mut table = Table::new();
    table.set_header(vec!["Month", "Predicted Savings"]);
    for p in &f.points {
        table.add_row(vec![
            Cell::new(&p.label),
            amount_cell(savings_text(p.predicted_savings, symbol)),
        ]);
    }
    let constant = if f.with_constant { " with constant" } else { "" };
    format!(
        "Savings Forecast ({}{constant})\n{table}\nNext month vs last observed: {}",
        f.order,
        signed_money(f.delta_vs_last(), symbol)
    )
}

pub fn format_recent(txns: &[&Transaction], symbol: &str) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Category"]);
    for t in txns {
        table.add_row(vec![
            Cell::new(t.date.format("%Y-%m-%d").to_string()),
            Cell::new(wrap(&t.description, DESCRIPTION_WIDTH)),
            amount_cell(savings_text(t.signed_amount, symbol)),
            Cell::new(t.category.label()),
        ]);
    }
    format!("Recent Transactions\n{table}")
}
