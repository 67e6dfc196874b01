mod aggregator;
mod classifier;
mod cli;
mod error;
mod export;
mod fmt;
mod forecast;
mod ingest;
mod mapping;
mod models;
mod normalizer;
mod pipeline;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigCommands};

fn init_logging(verbose: bool) {
    let default = if verbose { "cashraaga=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Columns {
            file,
            rows,
            type_col,
        } => cli::columns::run(file, *rows, type_col.as_deref()),
        Commands::Analyze { input, json } => cli::analyze::run(input, *json),
        Commands::Report { command } => cli::report::run(command),
        Commands::Export {
            input,
            output,
            monthly,
        } => cli::export::run(input, output.as_deref(), *monthly),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Init { force } => cli::config::init(*force),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
