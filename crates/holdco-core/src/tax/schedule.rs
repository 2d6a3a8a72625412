use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::types::{Money, Rate, Years, MAX_AMOUNT};
use crate::SimulationResult;

// ---------------------------------------------------------------------------
// Statutory figures
// ---------------------------------------------------------------------------

/// Every statutory rate and threshold the engine applies, versioned so a
/// projection can be re-run under a different year's law without touching
/// the computation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxSchedule {
    /// Label of the fiscal year the figures come from
    pub version: String,
    pub corporate: CorporateTaxBrackets,
    pub dividends: DividendTaxRules,
    /// Flat tax on the liquidation bonus paid out when the vehicle is wound up
    pub liquidation_bonus_rate: Rate,
    pub capital_gains: CapitalGainsRules,
}

/// Two-bracket corporate income tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorporateTaxBrackets {
    pub reduced_rate: Rate,
    /// Taxable result up to which the reduced rate applies
    pub reduced_rate_ceiling: Money,
    pub standard_rate: Rate,
}

/// Taxation of dividends received by the investor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendTaxRules {
    pub flat_rate: Rate,
    /// Share of (equity capital + shareholder advance) below which a majority
    /// manager's dividends stay under the flat rate
    pub majority_manager_threshold: Rate,
    /// Income-tax component applied above the threshold
    pub income_tax_rate: Rate,
    /// Social-charge component applied above the threshold
    pub social_charge_rate: Rate,
}

/// Capital gains realised by an individual, with holding-period rebates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalGainsRules {
    pub income_tax_rate: Rate,
    pub social_contribution_rate: Rate,
    pub income_tax_rebates: Vec<RebateBand>,
    pub social_contribution_rebates: Vec<RebateBand>,
}

/// Rebate accruing `rate_per_year` for every held year in `from_year..=to_year`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebateBand {
    pub from_year: Years,
    pub to_year: Years,
    pub rate_per_year: Rate,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for TaxSchedule {
    fn default() -> Self {
        TaxSchedule {
            version: "2024".into(),
            corporate: CorporateTaxBrackets::default(),
            dividends: DividendTaxRules::default(),
            liquidation_bonus_rate: dec!(0.30),
            capital_gains: CapitalGainsRules::default(),
        }
    }
}

impl Default for CorporateTaxBrackets {
    fn default() -> Self {
        CorporateTaxBrackets {
            reduced_rate: dec!(0.15),
            reduced_rate_ceiling: dec!(42500),
            standard_rate: dec!(0.25),
        }
    }
}

impl Default for DividendTaxRules {
    fn default() -> Self {
        DividendTaxRules {
            flat_rate: dec!(0.30),
            majority_manager_threshold: dec!(0.10),
            income_tax_rate: dec!(0.128),
            social_charge_rate: dec!(0.45),
        }
    }
}

impl Default for CapitalGainsRules {
    fn default() -> Self {
        CapitalGainsRules {
            income_tax_rate: dec!(0.19),
            social_contribution_rate: dec!(0.172),
            income_tax_rebates: vec![
                RebateBand::new(6, 21, dec!(0.06)),
                RebateBand::new(22, 22, dec!(0.04)),
            ],
            social_contribution_rebates: vec![
                RebateBand::new(6, 21, dec!(0.0165)),
                RebateBand::new(22, 22, dec!(0.016)),
                RebateBand::new(23, 30, dec!(0.09)),
            ],
        }
    }
}

impl RebateBand {
    pub fn new(from_year: Years, to_year: Years, rate_per_year: Rate) -> Self {
        RebateBand {
            from_year,
            to_year,
            rate_per_year,
        }
    }

    /// Number of held years falling inside this band.
    fn years_covered(&self, years_held: Years) -> Years {
        if years_held < self.from_year || self.to_year < self.from_year {
            return 0;
        }
        years_held.min(self.to_year) - self.from_year + 1
    }
}

impl TaxSchedule {
    /// Every rate must be a fraction in `[0, 1]` and the reduced-rate ceiling a
    /// non-negative amount within the accepted monetary range.
    pub fn validate(&self) -> SimulationResult<()> {
        let rates = [
            ("tax_schedule.corporate.reduced_rate", self.corporate.reduced_rate),
            ("tax_schedule.corporate.standard_rate", self.corporate.standard_rate),
            ("tax_schedule.dividends.flat_rate", self.dividends.flat_rate),
            (
                "tax_schedule.dividends.majority_manager_threshold",
                self.dividends.majority_manager_threshold,
            ),
            ("tax_schedule.dividends.income_tax_rate", self.dividends.income_tax_rate),
            ("tax_schedule.dividends.social_charge_rate", self.dividends.social_charge_rate),
            ("tax_schedule.liquidation_bonus_rate", self.liquidation_bonus_rate),
            ("tax_schedule.capital_gains.income_tax_rate", self.capital_gains.income_tax_rate),
            (
                "tax_schedule.capital_gains.social_contribution_rate",
                self.capital_gains.social_contribution_rate,
            ),
        ];
        for (field, value) in rates {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(SimulationError::invalid(field, "Rates must be between 0 and 1"));
            }
        }

        let bands = self
            .capital_gains
            .income_tax_rebates
            .iter()
            .chain(&self.capital_gains.social_contribution_rebates);
        for band in bands {
            if band.rate_per_year < Decimal::ZERO || band.rate_per_year > Decimal::ONE {
                return Err(SimulationError::invalid(
                    "tax_schedule.capital_gains.rebates",
                    "Yearly rebate must be between 0 and 1",
                ));
            }
        }

        let ceiling = self.corporate.reduced_rate_ceiling;
        if ceiling < Decimal::ZERO || ceiling > MAX_AMOUNT {
            return Err(SimulationError::invalid(
                "tax_schedule.corporate.reduced_rate_ceiling",
                format!("Must be between 0 and {MAX_AMOUNT}"),
            ));
        }
        Ok(())
    }
}

/// Cumulative rebate earned after `years_held`, capped at 100%.
pub fn cumulative_rebate(bands: &[RebateBand], years_held: Years) -> Rate {
    bands
        .iter()
        .map(|band| band.rate_per_year * Decimal::from(band.years_covered(years_held)))
        .sum::<Decimal>()
        .min(Decimal::ONE)
}
