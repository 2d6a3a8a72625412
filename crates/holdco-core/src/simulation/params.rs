use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::tax::TaxSchedule;
use crate::types::*;
use crate::SimulationResult;

/// Longest loan the engine accepts; keeps the simulated horizon bounded.
pub const MAX_LOAN_TERM_YEARS: Years = 50;

/// Years simulated after the loan is paid off.
pub const POST_LOAN_HORIZON_YEARS: Years = 25;

/// Bound on inflation and appreciation, in percent per year.
const MAX_GROWTH_PCT: Percent = dec!(50);

/// Acquisition, financing and operating assumptions for one projection.
///
/// Monetary amounts are non-negative; every `_pct` field is a percentage
/// (3.5 = 3.5%). Missing fields deserialize to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    // --- Acquisition ---
    pub acquisition_cost: Money,
    pub renovation_cost: Money,
    pub furniture_value: Money,
    pub notary_fees: Money,
    /// Bank filing fees, charged to the vehicle in year 1
    pub filing_fees: Money,

    // --- Funding ---
    pub equity_capital: Money,
    /// Initial shareholder advance lent by the investor to the vehicle
    pub shareholder_advance: Money,
    pub loan_rate_pct: Percent,
    /// Annual loan insurance, as a percentage of the amount borrowed
    pub loan_insurance_rate_pct: Percent,
    pub loan_term_years: Years,

    // --- Operations ---
    pub monthly_rent: Money,
    pub occupancy_rate_pct: Percent,
    pub monthly_condo_charges: Money,
    pub annual_property_tax: Money,
    /// Management fee, as a percentage of collected rent
    pub management_fee_pct: Percent,
    /// Unpaid-rent insurance, as a percentage of rent plus condo charges
    pub unpaid_rent_insurance_pct: Percent,
    pub owner_insurance: Money,
    pub local_business_tax: Money,
    /// Major-works provision, as a percentage of the property value
    pub major_works_provision_pct: Percent,

    // --- Depreciation ---
    pub building_depreciation_years: Years,
    pub works_depreciation_years: Years,
    pub furniture_depreciation_years: Years,
    /// Share of acquisition cost and notary fees attributable to land
    pub land_share_pct: Percent,

    // --- Distribution and macro ---
    pub dividend_distribution_pct: Percent,
    pub inflation_pct: Percent,
    pub appreciation_pct: Percent,
    /// Investor is a majority manager of the vehicle
    pub majority_manager: bool,

    pub tax_schedule: TaxSchedule,
}

impl SimulationParameters {
    /// Everything the vehicle pays for up front.
    pub fn total_project_cost(&self) -> Money {
        self.acquisition_cost + self.renovation_cost + self.furniture_value + self.notary_fees
    }

    /// Amount borrowed: project cost not covered by the investor's funds.
    pub fn loan_amount(&self) -> Money {
        (self.total_project_cost() - self.equity_capital - self.shareholder_advance).max(Decimal::ZERO)
    }

    /// Cash the investor puts in on day one.
    pub fn initial_outlay(&self) -> Money {
        self.equity_capital + self.shareholder_advance
    }

    /// Investor funds left in the vehicle once the project is paid for.
    pub fn opening_treasury(&self) -> Money {
        (self.initial_outlay() - self.total_project_cost()).max(Decimal::ZERO)
    }

    /// Base the market value of the property grows from.
    pub fn property_cost_basis(&self) -> Money {
        self.acquisition_cost + self.renovation_cost
    }

    /// Historical cost of every asset on the vehicle's books, land included.
    pub fn gross_book_cost(&self) -> Money {
        self.acquisition_cost + self.notary_fees + self.renovation_cost + self.furniture_value
    }

    /// Financed years actually simulated; a zero term counts as one year.
    pub fn effective_loan_term(&self) -> Years {
        self.loan_term_years.max(1)
    }

    /// Total simulated years: the loan plus the post-loan observation window.
    pub fn horizon_years(&self) -> Years {
        self.effective_loan_term() + POST_LOAN_HORIZON_YEARS
    }

    /// Reject records that break the boundary contract.
    pub fn validate(&self) -> SimulationResult<()> {
        let amounts = [
            ("acquisition_cost", self.acquisition_cost),
            ("renovation_cost", self.renovation_cost),
            ("furniture_value", self.furniture_value),
            ("notary_fees", self.notary_fees),
            ("filing_fees", self.filing_fees),
            ("equity_capital", self.equity_capital),
            ("shareholder_advance", self.shareholder_advance),
            ("monthly_rent", self.monthly_rent),
            ("monthly_condo_charges", self.monthly_condo_charges),
            ("annual_property_tax", self.annual_property_tax),
            ("owner_insurance", self.owner_insurance),
            ("local_business_tax", self.local_business_tax),
        ];
        for (field, value) in amounts {
            if value < Decimal::ZERO {
                return Err(SimulationError::invalid(field, "Monetary amounts must be non-negative"));
            }
            if value > MAX_AMOUNT {
                return Err(SimulationError::invalid(
                    field,
                    format!("Monetary amounts must not exceed {MAX_AMOUNT}"),
                ));
            }
        }

        let rates = [
            ("loan_rate_pct", self.loan_rate_pct),
            ("loan_insurance_rate_pct", self.loan_insurance_rate_pct),
            ("management_fee_pct", self.management_fee_pct),
            ("unpaid_rent_insurance_pct", self.unpaid_rent_insurance_pct),
            ("major_works_provision_pct", self.major_works_provision_pct),
        ];
        for (field, value) in rates {
            if value < Decimal::ZERO || value > dec!(100) {
                return Err(SimulationError::invalid(field, "Percentages must be between 0 and 100"));
            }
        }

        let shares = [
            ("occupancy_rate_pct", self.occupancy_rate_pct),
            ("land_share_pct", self.land_share_pct),
            ("dividend_distribution_pct", self.dividend_distribution_pct),
        ];
        for (field, value) in shares {
            if value < Decimal::ZERO || value > dec!(100) {
                return Err(SimulationError::invalid(field, "Must be between 0 and 100"));
            }
        }

        for (field, value) in [
            ("inflation_pct", self.inflation_pct),
            ("appreciation_pct", self.appreciation_pct),
        ] {
            if value <= dec!(-100) || value > MAX_GROWTH_PCT {
                return Err(SimulationError::invalid(
                    field,
                    format!("Must be greater than -100 and at most {MAX_GROWTH_PCT}"),
                ));
            }
        }

        if self.loan_term_years > MAX_LOAN_TERM_YEARS {
            return Err(SimulationError::invalid(
                "loan_term_years",
                format!("Loan term must not exceed {MAX_LOAN_TERM_YEARS} years"),
            ));
        }

        self.tax_schedule.validate()
    }
}
