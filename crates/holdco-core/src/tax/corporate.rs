use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::schedule::{CorporateTaxBrackets, DividendTaxRules, TaxSchedule};
use crate::types::*;
use crate::SimulationResult;

/// How the investor's dividends are taxed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendRegime {
    /// Every euro of dividend at the flat rate
    #[default]
    FlatTax,
    /// Flat rate up to a threshold, income tax plus social charges above it
    MajorityManager,
}

impl DividendRegime {
    pub fn from_majority_manager_flag(is_majority_manager: bool) -> Self {
        if is_majority_manager {
            DividendRegime::MajorityManager
        } else {
            DividendRegime::FlatTax
        }
    }
}

/// Corporate income tax on a taxable result. Losses carry no tax.
pub fn corporate_tax(taxable_result: Money, brackets: &CorporateTaxBrackets) -> Money {
    if taxable_result <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let reduced_base = taxable_result.min(brackets.reduced_rate_ceiling);
    let standard_base = (taxable_result - reduced_base).max(Decimal::ZERO);
    reduced_base * brackets.reduced_rate + standard_base * brackets.standard_rate
}

/// Input for a standalone corporate tax computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporateTaxInput {
    pub taxable_result: Money,
    #[serde(default)]
    pub tax_schedule: TaxSchedule,
}

/// Corporate tax split by bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateTaxBreakdown {
    pub taxable_result: Money,
    pub reduced_rate_base: Money,
    pub standard_rate_base: Money,
    pub tax: Money,
    pub effective_rate: Rate,
}

pub fn calculate_corporate_tax(
    input: &CorporateTaxInput,
) -> SimulationResult<ComputationOutput<CorporateTaxBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let brackets = &input.tax_schedule.corporate;

    let positive = input.taxable_result.max(Decimal::ZERO);
    let reduced_rate_base = positive.min(brackets.reduced_rate_ceiling);
    let standard_rate_base = positive - reduced_rate_base;
    let tax = corporate_tax(input.taxable_result, brackets);
    let effective_rate = if positive.is_zero() {
        warnings.push("Taxable result is not positive; no corporate tax due".into());
        Decimal::ZERO
    } else {
        tax / positive
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-bracket corporate income tax",
        input,
        warnings,
        elapsed,
        CorporateTaxBreakdown {
            taxable_result: input.taxable_result,
            reduced_rate_base,
            standard_rate_base,
            tax,
            effective_rate,
        },
    ))
}

/// Tax the investor pays on `dividends` under `regime`.
///
/// `threshold_base` is equity capital plus shareholder advance; only the
/// majority-manager regime uses it.
pub fn dividend_tax(
    dividends: Money,
    regime: DividendRegime,
    threshold_base: Money,
    rules: &DividendTaxRules,
) -> Money {
    if dividends <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match regime {
        DividendRegime::FlatTax => dividends * rules.flat_rate,
        DividendRegime::MajorityManager => {
            let threshold = (threshold_base * rules.majority_manager_threshold).max(Decimal::ZERO);
            let below = dividends.min(threshold);
            let above = dividends - below;
            below * rules.flat_rate
                + above * (rules.income_tax_rate + rules.social_charge_rate)
        }
    }
}
