use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use holdco_core::simulation::{self, SimulationParameters};
use holdco_core::types::with_metadata;

use crate::input;

/// Arguments for the full projection
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a JSON or YAML parameter file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the monthly rent of the parameter file
    #[arg(long)]
    pub monthly_rent: Option<Decimal>,

    /// Override the loan term in years
    #[arg(long)]
    pub loan_term_years: Option<u32>,

    /// Tax dividends under the majority-manager regime
    #[arg(long)]
    pub majority_manager: bool,

    /// Print headline figures instead of the year-by-year ledger
    #[arg(long)]
    pub summary: bool,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut params: SimulationParameters = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json|file.yaml> or stdin required for a simulation".into());
    };

    if let Some(rent) = args.monthly_rent {
        params.monthly_rent = rent;
    }
    if let Some(term) = args.loan_term_years {
        params.loan_term_years = term;
    }
    if args.majority_manager {
        params.majority_manager = true;
    }

    let output = simulation::simulate(&params)?;
    for warning in &output.warnings {
        tracing::info!(%warning, "simulation warning");
    }

    if args.summary {
        let summary = output.result.summary();
        let condensed = with_metadata(
            &output.methodology,
            &params,
            output.warnings,
            output.metadata.computation_time_us,
            summary,
        );
        return Ok(serde_json::to_value(condensed)?);
    }
    Ok(serde_json::to_value(output)?)
}
