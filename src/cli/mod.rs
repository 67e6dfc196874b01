pub mod analyze;
pub mod columns;
pub mod config;
pub mod export;
pub mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::mapping::{ColumnMapping, TypeColumn};
use crate::pipeline::{self, Analysis};
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(
    name = "cashraaga",
    version,
    about = "Analyse a bank statement: categories, monthly savings, UPI and EMI views, and a savings forecast."
)]
pub struct Cli {
    /// Log pipeline decisions to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a statement's columns and first rows, to pick a mapping.
    Columns {
        /// Path to a CSV or Excel statement
        file: PathBuf,
        /// Number of preview rows
        #[arg(long, default_value = "5")]
        rows: usize,
        /// Also list sample values of a candidate Credit/Debit column
        #[arg(long = "type-col")]
        type_col: Option<String>,
    },
    /// Run the full analysis and print every section.
    Analyze {
        #[command(flatten)]
        input: StatementArgs,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a single report section.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Write the categorized transactions (or monthly summary) to CSV.
    Export {
        #[command(flatten)]
        input: StatementArgs,
        /// Output path (default: cashraaga_analysed_statement.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Export the monthly inflow/outflow/savings table instead
        #[arg(long)]
        monthly: bool,
    },
    /// Show or create the settings file.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals and cleaning summary.
    Overview(StatementArgs),
    /// Inflow, outflow and savings per month.
    Monthly(StatementArgs),
    /// Spend per category.
    Categories(StatementArgs),
    /// UPI transactions and top counterparties.
    Upi(StatementArgs),
    /// EMI and loan debits.
    Emi(StatementArgs),
    /// Savings forecast for the next three months.
    Forecast(StatementArgs),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings.
    Show,
    /// Write default settings to disk.
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

/// A statement file plus the column mapping to apply to it.
#[derive(Args, Debug, Clone)]
pub struct StatementArgs {
    /// Path to a CSV or Excel statement
    pub file: PathBuf,
    #[command(flatten)]
    pub mapping: MappingArgs,
}

#[derive(Args, Debug, Clone)]
pub struct MappingArgs {
    /// Date column
    #[arg(long, default_value = "Date")]
    pub date: String,
    /// Description column
    #[arg(long, default_value = "Description")]
    pub description: String,
    /// Amount column
    #[arg(long, default_value = "Amount")]
    pub amount: String,
    /// Credit/Debit type column
    #[arg(long = "type-col")]
    pub type_col: Option<String>,
    /// Value marking a credit in the type column
    #[arg(long, requires = "type_col")]
    pub credit: Option<String>,
    /// Value marking a debit in the type column
    #[arg(long, requires = "type_col")]
    pub debit: Option<String>,
    /// Read numeric dates as day/month
    #[arg(long = "day-first", conflicts_with = "month_first")]
    pub day_first: bool,
    /// Read numeric dates as month/day, overriding a day-first setting
    #[arg(long = "month-first")]
    pub month_first: bool,
}

impl MappingArgs {
    /// Date order requested on the command line, if any.
    pub fn day_first_override(&self) -> Option<bool> {
        match (self.day_first, self.month_first) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn to_mapping(&self, settings: &Settings) -> ColumnMapping {
        let mapping = ColumnMapping::new(&self.date, &self.description, &self.amount);
        match &self.type_col {
            Some(col) => mapping.with_type_column(TypeColumn::new(col).with_tokens(
                self.credit.as_deref().unwrap_or(&settings.credit_token),
                self.debit.as_deref().unwrap_or(&settings.debit_token),
            )),
            None => mapping,
        }
    }
}

/// Load settings, apply command-line overrides and run the pipeline.
pub(crate) fn run_analysis(input: &StatementArgs) -> Result<(Settings, Analysis)> {
    let mut settings = load_settings();
    if let Some(day_first) = input.mapping.day_first_override() {
        settings.day_first = day_first;
    }
    let mapping = input.mapping.to_mapping(&settings);
    let analysis = pipeline::load_and_analyze(&input.file, &mapping, &settings)?;
    Ok((settings, analysis))
}
