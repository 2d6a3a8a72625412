use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::schedule::{cumulative_rebate, CapitalGainsRules, TaxSchedule};
use crate::types::*;
use crate::SimulationResult;

/// Input for a personal capital-gains computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalGainInput {
    pub gross_gain: Money,
    pub years_held: Years,
    #[serde(default)]
    pub tax_schedule: TaxSchedule,
}

/// Breakdown of the tax due on a personal capital gain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainTax {
    pub gross_gain: Money,
    pub income_tax_rebate: Rate,
    pub income_tax_base: Money,
    pub income_tax: Money,
    pub social_contribution_rebate: Rate,
    pub social_contribution_base: Money,
    pub social_contributions: Money,
    pub total_tax: Money,
}

/// Tax on a gain realised by an individual after `years_held` years.
/// The two rebate schedules run independently against the same gross gain.
pub fn assess(gross_gain: Money, years_held: Years, rules: &CapitalGainsRules) -> CapitalGainTax {
    if gross_gain <= Decimal::ZERO {
        return CapitalGainTax {
            gross_gain,
            income_tax_rebate: Decimal::ZERO,
            income_tax_base: Decimal::ZERO,
            income_tax: Decimal::ZERO,
            social_contribution_rebate: Decimal::ZERO,
            social_contribution_base: Decimal::ZERO,
            social_contributions: Decimal::ZERO,
            total_tax: Decimal::ZERO,
        };
    }

    let income_tax_rebate = cumulative_rebate(&rules.income_tax_rebates, years_held);
    let social_contribution_rebate = cumulative_rebate(&rules.social_contribution_rebates, years_held);

    let income_tax_base = (gross_gain * (Decimal::ONE - income_tax_rebate)).max(Decimal::ZERO);
    let social_contribution_base =
        (gross_gain * (Decimal::ONE - social_contribution_rebate)).max(Decimal::ZERO);

    let income_tax = income_tax_base * rules.income_tax_rate;
    let social_contributions = social_contribution_base * rules.social_contribution_rate;

    CapitalGainTax {
        gross_gain,
        income_tax_rebate,
        income_tax_base,
        income_tax,
        social_contribution_rebate,
        social_contribution_base,
        social_contributions,
        total_tax: income_tax + social_contributions,
    }
}

/// Total tax only.
pub fn personal_capital_gains_tax(gross_gain: Money, years_held: Years, rules: &CapitalGainsRules) -> Money {
    assess(gross_gain, years_held, rules).total_tax
}

/// Envelope-returning entry point for external callers.
pub fn calculate_capital_gains_tax(
    input: &CapitalGainInput,
) -> SimulationResult<ComputationOutput<CapitalGainTax>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = assess(input.gross_gain, input.years_held, &input.tax_schedule.capital_gains);
    if input.gross_gain <= Decimal::ZERO {
        warnings.push("Gain is not positive; no tax due".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Personal capital gains with holding-period rebates",
        input,
        warnings,
        elapsed,
        result,
    ))
}
