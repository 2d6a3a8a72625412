use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::params::SimulationParameters;
use super::state::{advance_year, LoanPhase, SimulationContext, SimulationState, YearRecord};
use crate::financing::amortization::AmortizationSchedule;
use crate::types::*;
use crate::SimulationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One row of the projection ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Year(YearRecord),
    /// Boundary between the last financed year and the first debt-free one
    LoanPaidOff { after_year: Years },
}

/// Full output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub loan_amount: Money,
    pub initial_outlay: Money,
    pub loan_schedule: AmortizationSchedule,
    pub entries: Vec<LedgerEntry>,
}

impl Projection {
    /// Year records in order, without the separator.
    pub fn years(&self) -> impl Iterator<Item = &YearRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            LedgerEntry::Year(record) => Some(record),
            LedgerEntry::LoanPaidOff { .. } => None,
        })
    }

    pub fn final_year(&self) -> Option<&YearRecord> {
        self.years().last()
    }

    /// Mean monthly net investor cash flow, over one phase or the whole run.
    pub fn average_monthly_net_cash_flow(&self, phase: Option<LoanPhase>) -> Money {
        let flows: Vec<Money> = self
            .years()
            .filter(|r| phase.is_none_or(|p| r.phase == p))
            .map(|r| r.net_investor_cash_flow)
            .collect();
        if flows.is_empty() {
            return Decimal::ZERO;
        }
        let total: Money = flows.iter().copied().sum();
        total / Decimal::from(flows.len() as u64) / Decimal::from(12)
    }

    pub fn final_asset_sale_irr(&self) -> Rate {
        self.final_year().map_or(Decimal::ZERO, |r| r.asset_sale.irr)
    }

    pub fn final_share_sale_irr(&self) -> Rate {
        self.final_year().map_or(Decimal::ZERO, |r| r.share_sale.irr)
    }

    pub fn total_capital_injections(&self) -> Money {
        self.years().map(|r| r.capital_injection).sum()
    }

    /// Headline figures of the run.
    pub fn summary(&self) -> ProjectionSummary {
        let last = self.final_year();
        ProjectionSummary {
            loan_amount: self.loan_amount,
            initial_outlay: self.initial_outlay,
            monthly_payment: self.loan_schedule.monthly_payment,
            total_interest: self.loan_schedule.total_interest(),
            horizon_years: last.map_or(0, |r| r.year),
            average_monthly_cash_flow_during_loan: self
                .average_monthly_net_cash_flow(Some(LoanPhase::DuringLoan)),
            average_monthly_cash_flow_post_loan: self
                .average_monthly_net_cash_flow(Some(LoanPhase::PostLoan)),
            total_capital_injections: self.total_capital_injections(),
            final_asset_sale_net_enrichment: last
                .map_or(Decimal::ZERO, |r| r.asset_sale.net_enrichment),
            final_asset_sale_irr: self.final_asset_sale_irr(),
            final_share_sale_net_enrichment: last
                .map_or(Decimal::ZERO, |r| r.share_sale.net_enrichment),
            final_share_sale_irr: self.final_share_sale_irr(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub loan_amount: Money,
    pub initial_outlay: Money,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub horizon_years: Years,
    pub average_monthly_cash_flow_during_loan: Money,
    pub average_monthly_cash_flow_post_loan: Money,
    pub total_capital_injections: Money,
    pub final_asset_sale_net_enrichment: Money,
    pub final_asset_sale_irr: Rate,
    pub final_share_sale_net_enrichment: Money,
    pub final_share_sale_irr: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a projection and wrap it in the standard output envelope.
pub fn simulate(params: &SimulationParameters) -> SimulationResult<ComputationOutput<Projection>> {
    let start = Instant::now();
    let (projection, warnings) = run(params)?;
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Leveraged rental property in a corporate-taxed vehicle: annual fiscal and cash-flow projection with asset-sale and share-sale exits",
        params,
        warnings,
        elapsed,
        projection,
    ))
}

/// Run a projection, returning the ledger and the warnings raised along the way.
pub fn run(params: &SimulationParameters) -> SimulationResult<(Projection, Vec<String>)> {
    params.validate()?;

    let ctx = SimulationContext::new(params);
    let horizon = params.horizon_years();
    let mut warnings: Vec<String> = Vec::new();

    if params.loan_term_years == 0 && !ctx.loan_amount.is_zero() {
        warnings.push("Loan term of 0 years simulated as a one-year loan".into());
    }
    if !ctx.loan_amount.is_zero() && ctx.schedule.is_empty() {
        warnings.push(format!(
            "Borrowed amount {} has no amortization schedule (rate must be positive); no debt service, loan insurance or outstanding balance is simulated, and exit valuations treat the vehicle as debt-free",
            ctx.loan_amount.round_dp(2)
        ));
    }

    tracing::info!(
        loan_amount = %ctx.loan_amount.round_dp(2),
        loan_term = ctx.loan_term,
        horizon,
        "starting projection"
    );

    let (_, entries, warnings) = (1..=horizon).fold(
        (SimulationState::initial(params), Vec::with_capacity(horizon as usize + 1), warnings),
        |(state, mut entries, mut warnings), year| {
            let outcome = advance_year(&state, year, &ctx);
            entries.push(LedgerEntry::Year(outcome.record));
            if year == ctx.last_financed_year() {
                entries.push(LedgerEntry::LoanPaidOff { after_year: year });
            }
            warnings.extend(outcome.warnings);
            (outcome.state, entries, warnings)
        },
    );

    let projection = Projection {
        loan_amount: ctx.loan_amount,
        initial_outlay: params.initial_outlay(),
        loan_schedule: ctx.schedule.clone(),
        entries,
    };

    tracing::info!(
        years = horizon,
        injections = %projection.total_capital_injections().round_dp(2),
        final_asset_sale_irr = %projection.final_asset_sale_irr().round_dp(4),
        final_share_sale_irr = %projection.final_share_sale_irr().round_dp(4),
        warnings = warnings.len(),
        "projection complete"
    );

    Ok((projection, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params() -> SimulationParameters {
        SimulationParameters {
            acquisition_cost: dec!(200000),
            renovation_cost: dec!(30000),
            furniture_value: dec!(15000),
            notary_fees: dec!(16000),
            filing_fees: dec!(1500),
            equity_capital: dec!(5000),
            shareholder_advance: dec!(15000),
            loan_rate_pct: dec!(3.5),
            loan_insurance_rate_pct: dec!(0.34),
            loan_term_years: 20,
            monthly_rent: dec!(1200),
            occupancy_rate_pct: dec!(95),
            monthly_condo_charges: dec!(100),
            annual_property_tax: dec!(1000),
            management_fee_pct: dec!(7),
            unpaid_rent_insurance_pct: dec!(3.5),
            owner_insurance: dec!(200),
            local_business_tax: dec!(200),
            building_depreciation_years: 30,
            works_depreciation_years: 15,
            furniture_depreciation_years: 7,
            land_share_pct: dec!(15),
            dividend_distribution_pct: dec!(100),
            inflation_pct: dec!(2),
            appreciation_pct: dec!(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_horizon_and_single_separator() {
        let (projection, _) = run(&params()).unwrap();
        assert_eq!(projection.years().count(), 45);
        assert_eq!(projection.entries.len(), 46);
        let separators: Vec<&LedgerEntry> = projection
            .entries
            .iter()
            .filter(|e| matches!(e, LedgerEntry::LoanPaidOff { .. }))
            .collect();
        assert_eq!(separators, vec![&LedgerEntry::LoanPaidOff { after_year: 20 }]);
        assert!(matches!(projection.entries[20], LedgerEntry::LoanPaidOff { after_year: 20 }));
    }

    #[test]
    fn test_invalid_parameters_rejected_upfront() {
        let mut p = params();
        p.monthly_rent = dec!(-1);
        assert!(run(&p).is_err());
    }

    #[test]
    fn test_average_monthly_cash_flow_matches_records() {
        let (projection, _) = run(&params()).unwrap();
        let during: Vec<Money> = projection
            .years()
            .filter(|r| r.phase == LoanPhase::DuringLoan)
            .map(|r| r.net_investor_cash_flow)
            .collect();
        let expected = during.iter().copied().sum::<Decimal>() / dec!(20) / dec!(12);
        assert_eq!(
            projection.average_monthly_net_cash_flow(Some(LoanPhase::DuringLoan)),
            expected
        );
    }

    #[test]
    fn test_summary_reads_final_year() {
        let (projection, _) = run(&params()).unwrap();
        let summary = projection.summary();
        let last = projection.final_year().unwrap();
        assert_eq!(summary.horizon_years, 45);
        assert_eq!(summary.loan_amount, dec!(241000));
        assert_eq!(summary.final_share_sale_irr, last.share_sale.irr);
        assert_eq!(summary.final_asset_sale_net_enrichment, last.asset_sale.net_enrichment);
    }

    #[test]
    fn test_envelope_metadata() {
        let out = simulate(&params()).unwrap();
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert_eq!(out.assumptions["loan_term_years"], 20);
    }

    #[test]
    fn test_zero_term_warns_and_runs_one_financed_year() {
        let mut p = params();
        p.loan_term_years = 0;
        let (projection, warnings) = run(&p).unwrap();
        assert_eq!(projection.years().count(), 26);
        assert!(matches!(projection.entries[1], LedgerEntry::LoanPaidOff { after_year: 1 }));
        assert!(warnings.iter().any(|w| w.contains("one-year loan")));
    }
}
