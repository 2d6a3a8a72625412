use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tax::capital_gains::personal_capital_gains_tax;
use crate::tax::corporate::corporate_tax;
use crate::tax::TaxSchedule;
use crate::time_value;
use crate::types::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything an exit valuation needs to know about the vehicle at the end
/// of a given year, after that year's distributions.
#[derive(Debug, Clone)]
pub struct ExitSnapshot<'a> {
    pub year: Years,
    pub property_value: Money,
    pub gross_book_cost: Money,
    pub cumulative_depreciation: Money,
    pub operating_result: Money,
    pub operating_tax: Money,
    pub treasury: Money,
    pub remaining_loan_balance: Money,
    pub shareholder_advance_balance: Money,
    pub equity_capital: Money,
    pub initial_shareholder_advance: Money,
    pub cumulative_injections: Money,
    pub initial_outlay: Money,
    /// Net investor flow of every year so far, this year included
    pub investor_cash_flows: &'a [Money],
}

/// Exit by selling the property and winding up the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSaleOutcome {
    pub sale_price: Money,
    pub net_book_value: Money,
    pub taxable_capital_gain: Money,
    /// Corporate tax attributable to the gain
    pub capital_gain_tax: Money,
    pub advance_repayment: Money,
    pub equity_repayment: Money,
    pub liquidation_bonus: Money,
    pub liquidation_bonus_tax: Money,
    pub net_proceeds: Money,
    pub net_enrichment: Money,
    pub irr: Rate,
}

/// Exit by selling the investor's position in the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSaleOutcome {
    pub sale_price: Money,
    pub cost_basis: Money,
    pub capital_gain: Money,
    pub capital_gain_tax: Money,
    pub net_proceeds: Money,
    pub net_enrichment: Money,
    pub irr: Rate,
}

/// Both exit scenarios for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitValuation {
    pub asset_sale: AssetSaleOutcome,
    pub share_sale: ShareSaleOutcome,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value both exits as of `snapshot.year`.
pub fn value_exits(snapshot: &ExitSnapshot<'_>, schedule: &TaxSchedule) -> ExitValuation {
    let mut warnings: Vec<String> = Vec::new();
    let asset_sale = value_asset_sale(snapshot, schedule, &mut warnings);
    let share_sale = value_share_sale(snapshot, schedule, &mut warnings);
    ExitValuation {
        asset_sale,
        share_sale,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Asset sale
// ---------------------------------------------------------------------------

fn value_asset_sale(
    s: &ExitSnapshot<'_>,
    schedule: &TaxSchedule,
    warnings: &mut Vec<String>,
) -> AssetSaleOutcome {
    let sale_price = s.property_value;
    let net_book_value = s.gross_book_cost - s.cumulative_depreciation;
    let taxable_capital_gain = (sale_price - net_book_value).max(Decimal::ZERO);

    // Gain taxed at the marginal brackets left over by the operating result
    let combined_tax = corporate_tax(s.operating_result + taxable_capital_gain, &schedule.corporate);
    let capital_gain_tax = (combined_tax - s.operating_tax).max(Decimal::ZERO);

    let available = s.treasury + sale_price - capital_gain_tax - s.remaining_loan_balance;

    let (advance_repayment, equity_repayment, liquidation_bonus, liquidation_bonus_tax, net_proceeds) =
        if available < Decimal::ZERO {
            warnings.push(format!(
                "Year {}: asset sale does not cover the remaining loan; investor funds a shortfall of {}",
                s.year,
                (-available).round_dp(2)
            ));
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, available)
        } else {
            let advance = available.min(s.shareholder_advance_balance);
            let rest = available - advance;
            let equity = rest.min(s.equity_capital);
            let bonus = rest - equity;
            let bonus_tax = bonus * schedule.liquidation_bonus_rate;
            (advance, equity, bonus, bonus_tax, advance + equity + bonus - bonus_tax)
        };

    let (net_enrichment, irr) = evaluate_timeline(s, net_proceeds, "asset sale", warnings);

    AssetSaleOutcome {
        sale_price,
        net_book_value,
        taxable_capital_gain,
        capital_gain_tax,
        advance_repayment,
        equity_repayment,
        liquidation_bonus,
        liquidation_bonus_tax,
        net_proceeds,
        net_enrichment,
        irr,
    }
}

// ---------------------------------------------------------------------------
// Share sale
// ---------------------------------------------------------------------------

fn value_share_sale(
    s: &ExitSnapshot<'_>,
    schedule: &TaxSchedule,
    warnings: &mut Vec<String>,
) -> ShareSaleOutcome {
    let sale_price = s.property_value + s.treasury - s.remaining_loan_balance;
    let cost_basis = s.equity_capital + s.initial_shareholder_advance + s.cumulative_injections;
    let capital_gain = sale_price - cost_basis;
    let capital_gain_tax = personal_capital_gains_tax(capital_gain, s.year, &schedule.capital_gains);
    let net_proceeds = sale_price - capital_gain_tax;

    let (net_enrichment, irr) = evaluate_timeline(s, net_proceeds, "share sale", warnings);

    ShareSaleOutcome {
        sale_price,
        cost_basis,
        capital_gain,
        capital_gain_tax,
        net_proceeds,
        net_enrichment,
        irr,
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Initial outlay, every year's net flow, then the terminal proceeds added to
/// the final year.
pub fn exit_timeline(initial_outlay: Money, investor_cash_flows: &[Money], terminal_proceeds: Money) -> Vec<Money> {
    let mut timeline = Vec::with_capacity(investor_cash_flows.len() + 1);
    timeline.push(-initial_outlay);
    timeline.extend_from_slice(investor_cash_flows);
    if let Some(last) = timeline.last_mut() {
        *last += terminal_proceeds;
    }
    timeline
}

/// Returns (net enrichment, IRR) of a scenario's timeline.
fn evaluate_timeline(
    s: &ExitSnapshot<'_>,
    terminal_proceeds: Money,
    scenario: &str,
    warnings: &mut Vec<String>,
) -> (Money, Rate) {
    let timeline = exit_timeline(s.initial_outlay, s.investor_cash_flows, terminal_proceeds);
    let net_enrichment: Money = timeline.iter().copied().sum();
    let irr = time_value::irr_or_zero(&timeline, &format!("Year {}: {scenario}", s.year), warnings);
    (net_enrichment, irr)
}
