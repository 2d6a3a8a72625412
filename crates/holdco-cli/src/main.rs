mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::financing::{AmortizationArgs, IrrArgs};
use commands::simulate::SimulateArgs;
use commands::tax::{CapitalGainsTaxArgs, CorporateTaxArgs};

/// Leveraged rental property held through a corporate-taxed vehicle
#[derive(Parser)]
#[command(
    name = "holdco",
    version,
    about = "Multi-year projections of a leveraged rental property held through a corporate-taxed vehicle",
    long_about = "Simulates the annual fiscal and cash-flow life of a property bought on credit \
                  inside a company taxed at corporate rates, with asset-sale and share-sale exit \
                  valuations for every year. Inputs are JSON or YAML files, or JSON on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full year-by-year projection
    Simulate(SimulateArgs),
    /// Annual amortization schedule of a constant-payment loan
    Amortization(AmortizationArgs),
    /// Internal rate of return of a cash-flow series
    Irr(IrrArgs),
    /// Corporate income tax on a taxable result
    CorporateTax(CorporateTaxArgs),
    /// Personal capital-gains tax with holding-period rebates
    CapitalGainsTax(CapitalGainsTaxArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Amortization(args) => commands::financing::run_amortization(args),
        Commands::Irr(args) => commands::financing::run_irr(args),
        Commands::CorporateTax(args) => commands::tax::run_corporate_tax(args),
        Commands::CapitalGainsTax(args) => commands::tax::run_capital_gains_tax(args),
        Commands::Version => {
            println!("holdco {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Logs go to stderr so that stdout carries only the formatted result.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
