use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use super::depreciation::{DepreciationCharge, DepreciationPlan};
use super::exit::{self, AssetSaleOutcome, ExitSnapshot, ShareSaleOutcome};
use super::params::SimulationParameters;
use crate::financing::amortization::{self, AmortizationSchedule};
use crate::tax::corporate::{corporate_tax, dividend_tax, DividendRegime};
use crate::types::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether the year still carries debt service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPhase {
    DuringLoan,
    PostLoan,
}

/// Balances carried from one year to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub cumulative_depreciation: Money,
    /// Cash held by the vehicle; never negative
    pub treasury: Money,
    /// Shareholder advance still owed to the investor; never negative
    pub shareholder_advance_balance: Money,
    pub cumulative_injections: Money,
    /// Net dividends plus advance repayments received so far
    pub cumulative_investor_cash: Money,
    /// Net investor flow of every simulated year, in order
    pub investor_cash_flows: Vec<Money>,
}

impl SimulationState {
    pub fn initial(params: &SimulationParameters) -> Self {
        SimulationState {
            cumulative_depreciation: Decimal::ZERO,
            treasury: params.opening_treasury(),
            shareholder_advance_balance: params.shareholder_advance,
            cumulative_injections: Decimal::ZERO,
            cumulative_investor_cash: Decimal::ZERO,
            investor_cash_flows: Vec::new(),
        }
    }
}

/// One simulated year, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: Years,
    pub phase: LoanPhase,
    pub gross_rent: Money,
    pub deductible_charges: Money,
    pub major_works_provision: Money,
    pub interest: Money,
    pub principal_repaid: Money,
    pub loan_insurance: Money,
    pub depreciation: Money,
    pub taxable_result: Money,
    pub corporate_tax: Money,
    /// Profit after tax available for distribution (never negative)
    pub distributable_profit: Money,
    pub capital_injection: Money,
    pub advance_repayment: Money,
    pub dividends_paid: Money,
    pub dividend_tax: Money,
    pub net_investor_cash_flow: Money,
    pub treasury: Money,
    pub shareholder_advance_balance: Money,
    pub remaining_loan_balance: Money,
    pub property_value: Money,
    pub asset_sale: AssetSaleOutcome,
    pub share_sale: ShareSaleOutcome,
}

/// Run-wide values fixed before the first year.
#[derive(Debug, Clone)]
pub struct SimulationContext<'a> {
    pub params: &'a SimulationParameters,
    pub schedule: AmortizationSchedule,
    pub depreciation: DepreciationPlan,
    pub loan_amount: Money,
    pub loan_term: Years,
    pub annual_loan_insurance: Money,
    pub regime: DividendRegime,
}

impl<'a> SimulationContext<'a> {
    pub fn new(params: &'a SimulationParameters) -> Self {
        let loan_amount = params.loan_amount();
        let loan_term = params.effective_loan_term();
        let schedule = amortization::build_schedule(loan_amount, params.loan_rate_pct, loan_term);
        let annual_loan_insurance = loan_amount * pct(params.loan_insurance_rate_pct);

        SimulationContext {
            params,
            schedule,
            depreciation: DepreciationPlan::from_parameters(params),
            loan_amount,
            loan_term,
            annual_loan_insurance,
            regime: DividendRegime::from_majority_manager_flag(params.majority_manager),
        }
    }

    /// A year is financed when the amortization schedule has data for it.
    pub fn phase(&self, year: Years) -> LoanPhase {
        match self.schedule.year(year) {
            Some(_) => LoanPhase::DuringLoan,
            None => LoanPhase::PostLoan,
        }
    }

    /// Last year carrying debt service; 0 when nothing is amortized.
    pub fn last_financed_year(&self) -> Years {
        self.schedule.term_years()
    }

    /// Market value of the property at the end of `year`.
    pub fn property_value(&self, year: Years) -> Money {
        self.params.property_cost_basis() * growth_factor(self.params.appreciation_pct, year)
    }

    /// Price index applied to rents and charges during `year`.
    pub fn inflation_factor(&self, year: Years) -> Rate {
        growth_factor(self.params.inflation_pct, year.saturating_sub(1))
    }
}

/// Result of one transition.
#[derive(Debug, Clone)]
pub struct YearOutcome {
    pub state: SimulationState,
    pub record: YearRecord,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// Rents, charges and debt service of one year, before tax.
struct OperatingYear {
    gross_rent: Money,
    deductible_charges: Money,
    major_works_provision: Money,
    interest: Money,
    principal_repaid: Money,
    loan_insurance: Money,
    depreciation: DepreciationCharge,
    property_value: Money,
}

impl OperatingYear {
    fn taxable_result(&self) -> Money {
        self.gross_rent - self.deductible_charges - self.interest - self.loan_insurance - self.depreciation.total()
    }

    fn debt_service(&self) -> Money {
        self.interest + self.principal_repaid + self.loan_insurance
    }

    /// Cash generated before corporate tax.
    fn cash_inflow(&self) -> Money {
        self.gross_rent - self.deductible_charges - self.major_works_provision - self.debt_service()
    }
}

fn operate(year: Years, ctx: &SimulationContext<'_>) -> OperatingYear {
    let p = ctx.params;
    let inflation = ctx.inflation_factor(year);

    let gross_rent = p.monthly_rent * Decimal::from(12) * inflation * pct(p.occupancy_rate_pct);
    let condo_charges = p.monthly_condo_charges * Decimal::from(12) * inflation;
    let property_tax = p.annual_property_tax * inflation;
    let owner_insurance = p.owner_insurance * inflation;
    let business_tax = p.local_business_tax * inflation;
    let management_fee = gross_rent * pct(p.management_fee_pct);
    let unpaid_rent_insurance = (gross_rent + condo_charges) * pct(p.unpaid_rent_insurance_pct);
    let filing_fees = if year == 1 { p.filing_fees } else { Decimal::ZERO };

    let deductible_charges = condo_charges
        + property_tax
        + owner_insurance
        + business_tax
        + management_fee
        + unpaid_rent_insurance
        + filing_fees;

    let property_value = ctx.property_value(year);
    let loan_insurance = match ctx.phase(year) {
        LoanPhase::DuringLoan => ctx.annual_loan_insurance,
        LoanPhase::PostLoan => Decimal::ZERO,
    };

    OperatingYear {
        gross_rent,
        deductible_charges,
        major_works_provision: property_value * pct(p.major_works_provision_pct),
        interest: ctx.schedule.interest(year),
        principal_repaid: ctx.schedule.principal_repaid(year),
        loan_insurance,
        depreciation: ctx.depreciation.charge_for_year(year),
        property_value,
    }
}

/// Advance the vehicle by one year.
///
/// Pure: the previous state is left untouched and the new state, the year's
/// record and any warnings are returned.
pub fn advance_year(state: &SimulationState, year: Years, ctx: &SimulationContext<'_>) -> YearOutcome {
    let p = ctx.params;
    let rules = &p.tax_schedule;
    let mut warnings: Vec<String> = Vec::new();

    let op = operate(year, ctx);
    let depreciation = op.depreciation.total();

    // --- Corporate tax ---
    let taxable_result = op.taxable_result();
    let tax = corporate_tax(taxable_result, &rules.corporate);
    let accounting_result = taxable_result - op.major_works_provision;
    let distributable_profit = (accounting_result - tax).max(Decimal::ZERO);

    // --- Treasury, injecting capital on a shortfall ---
    let treasury_before = state.treasury + op.cash_inflow() - tax;
    let (mut treasury, capital_injection) = if treasury_before < Decimal::ZERO {
        warnings.push(format!(
            "Year {year}: treasury shortfall of {} covered by a shareholder advance",
            (-treasury_before).round_dp(2)
        ));
        (Decimal::ZERO, -treasury_before)
    } else {
        (treasury_before, Decimal::ZERO)
    };
    let advance_before_repayment = state.shareholder_advance_balance + capital_injection;

    // --- Distribution: advance first, then dividends ---
    let advance_repayment = treasury.min(advance_before_repayment).max(Decimal::ZERO);
    treasury -= advance_repayment;
    let shareholder_advance_balance = advance_before_repayment - advance_repayment;

    if distributable_profit > treasury && !p.dividend_distribution_pct.is_zero() {
        warnings.push(format!(
            "Year {year}: dividends limited to the treasury available ({} of {} distributable)",
            treasury.max(Decimal::ZERO).round_dp(2),
            distributable_profit.round_dp(2)
        ));
    }
    let dividends_paid = distributable_profit.min(treasury).max(Decimal::ZERO) * pct(p.dividend_distribution_pct);
    let dividend_tax = dividend_tax(
        dividends_paid,
        ctx.regime,
        p.equity_capital + advance_before_repayment,
        &rules.dividends,
    );
    treasury -= dividends_paid;

    let net_investor_cash_flow = dividends_paid - dividend_tax + advance_repayment - capital_injection;

    let mut investor_cash_flows = state.investor_cash_flows.clone();
    investor_cash_flows.push(net_investor_cash_flow);

    let next = SimulationState {
        cumulative_depreciation: state.cumulative_depreciation + depreciation,
        treasury,
        shareholder_advance_balance,
        cumulative_injections: state.cumulative_injections + capital_injection,
        cumulative_investor_cash: state.cumulative_investor_cash + dividends_paid - dividend_tax
            + advance_repayment,
        investor_cash_flows,
    };

    // --- Exit valuations as of year end ---
    let remaining_loan_balance = ctx.schedule.remaining_balance(year);
    let exits = exit::value_exits(
        &ExitSnapshot {
            year,
            property_value: op.property_value,
            gross_book_cost: p.gross_book_cost(),
            cumulative_depreciation: next.cumulative_depreciation,
            operating_result: taxable_result,
            operating_tax: tax,
            treasury: next.treasury,
            remaining_loan_balance,
            shareholder_advance_balance: next.shareholder_advance_balance,
            equity_capital: p.equity_capital,
            initial_shareholder_advance: p.shareholder_advance,
            cumulative_injections: next.cumulative_injections,
            initial_outlay: p.initial_outlay(),
            investor_cash_flows: &next.investor_cash_flows,
        },
        rules,
    );
    warnings.extend(exits.warnings);

    tracing::debug!(
        year,
        taxable_result = %taxable_result.round_dp(2),
        corporate_tax = %tax.round_dp(2),
        treasury = %next.treasury.round_dp(2),
        advance_balance = %next.shareholder_advance_balance.round_dp(2),
        net_cash = %net_investor_cash_flow.round_dp(2),
        "year simulated"
    );

    let record = YearRecord {
        year,
        phase: ctx.phase(year),
        gross_rent: op.gross_rent,
        deductible_charges: op.deductible_charges,
        major_works_provision: op.major_works_provision,
        interest: op.interest,
        principal_repaid: op.principal_repaid,
        loan_insurance: op.loan_insurance,
        depreciation,
        taxable_result,
        corporate_tax: tax,
        distributable_profit,
        capital_injection,
        advance_repayment,
        dividends_paid,
        dividend_tax,
        net_investor_cash_flow,
        treasury: next.treasury,
        shareholder_advance_balance: next.shareholder_advance_balance,
        remaining_loan_balance,
        property_value: op.property_value,
        asset_sale: exits.asset_sale,
        share_sale: exits.share_sale,
    };

    YearOutcome {
        state: next,
        record,
        warnings,
    }
}

/// `(1 + rate)^years` for a percentage rate.
fn growth_factor(rate_pct: Percent, years: Years) -> Rate {
    (Decimal::ONE + pct(rate_pct)).powu(u64::from(years))
}
