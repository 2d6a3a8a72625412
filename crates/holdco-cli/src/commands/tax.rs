use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use holdco_core::tax::capital_gains::{self, CapitalGainInput};
use holdco_core::tax::corporate::{self, CorporateTaxInput};
use holdco_core::tax::TaxSchedule;

use crate::input;

/// Arguments for corporate income tax
#[derive(Args)]
pub struct CorporateTaxArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Taxable result of the year
    #[arg(long, allow_hyphen_values = true)]
    pub taxable_result: Option<Decimal>,

    /// Tax schedule file replacing the built-in rates
    #[arg(long)]
    pub schedule: Option<String>,
}

pub fn run_corporate_tax(args: CorporateTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: CorporateTaxInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CorporateTaxInput {
            taxable_result: args
                .taxable_result
                .ok_or("--taxable-result is required (or provide --input)")?,
            tax_schedule: load_schedule(args.schedule.as_deref())?,
        }
    };

    let result = corporate::calculate_corporate_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for personal capital-gains tax
#[derive(Args)]
pub struct CapitalGainsTaxArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross gain realised
    #[arg(long, allow_hyphen_values = true)]
    pub gain: Option<Decimal>,

    /// Full years the asset was held
    #[arg(long)]
    pub years_held: Option<u32>,

    /// Tax schedule file replacing the built-in rates
    #[arg(long)]
    pub schedule: Option<String>,
}

pub fn run_capital_gains_tax(args: CapitalGainsTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let gain_input: CapitalGainInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CapitalGainInput {
            gross_gain: args.gain.ok_or("--gain is required (or provide --input)")?,
            years_held: args
                .years_held
                .ok_or("--years-held is required (or provide --input)")?,
            tax_schedule: load_schedule(args.schedule.as_deref())?,
        }
    };

    let result = capital_gains::calculate_capital_gains_tax(&gain_input)?;
    Ok(serde_json::to_value(result)?)
}

fn load_schedule(path: Option<&str>) -> Result<TaxSchedule, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let schedule: TaxSchedule = input::file::read_input(path)?;
            tracing::info!(version = %schedule.version, "using tax schedule from file");
            Ok(schedule)
        }
        None => Ok(TaxSchedule::default()),
    }
}
