use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use holdco_core::financing::amortization::{self, LoanTerms};
use holdco_core::time_value::{self, IrrInput};

use crate::input;

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct AmortizationArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual nominal rate in percent (3.5 = 3.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term_years: Option<u32>,
}

pub fn run_amortization(args: AmortizationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
        }
    };

    let result = amortization::amortize(&terms)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for an IRR computation
#[derive(Args)]
pub struct IrrArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash flows, period 0 first (comma-separated, e.g. "-20000,1500,1500,40000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting rate for the solver (0.10 = 10%)
    #[arg(long)]
    pub guess: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        IrrInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            guess: args.guess,
        }
    };

    let result = time_value::calculate_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
