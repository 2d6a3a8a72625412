use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SimulationError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::SimulationResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const STEP_THRESHOLD: Decimal = dec!(0.000000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(100);
const DEFAULT_GUESS: Decimal = dec!(0.10);

/// Candidate rates sampled when Newton-Raphson fails and a bracket has to be found.
const BRACKET_GRID: [Decimal; 12] = [
    dec!(-0.99),
    dec!(-0.9),
    dec!(-0.5),
    dec!(-0.2),
    dec!(0),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(2),
    dec!(10),
    dec!(100),
];

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> SimulationResult<Money> {
    if rate <= dec!(-1) {
        return Err(SimulationError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_and_derivative(cash_flows, rate)
        .map(|(value, _)| value)
        .ok_or_else(|| SimulationError::DivisionByZero {
            context: format!("NPV discount factors at rate {rate} overflow"),
        })
}

/// Internal Rate of Return: Newton-Raphson from `guess`, falling back to
/// bisection over a bracketed sign change.
///
/// Fails with `InsufficientData` when the timeline cannot have a real root
/// (fewer than two flows, or no sign change) and with `ConvergenceFailure`
/// when neither method settles.
pub fn irr(cash_flows: &[Money], guess: Rate) -> SimulationResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(SimulationError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !(has_outflow && has_inflow) {
        return Err(SimulationError::InsufficientData(
            "IRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    if let Some(rate) = newton_raphson(cash_flows, guess) {
        return Ok(rate);
    }

    bisection(cash_flows)
}

/// IRR for callers that must never fail: any degenerate timeline yields 0,
/// and the reason is pushed onto `warnings` prefixed with `context`.
pub fn irr_or_zero(cash_flows: &[Money], context: &str, warnings: &mut Vec<String>) -> Rate {
    match irr(cash_flows, DEFAULT_GUESS) {
        Ok(rate) => rate,
        Err(e) => {
            warnings.push(format!("{context}: IRR reported as 0 ({e})"));
            Decimal::ZERO
        }
    }
}

/// Input for a standalone IRR computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    /// One flow per period, the first being period 0
    pub cash_flows: Vec<Money>,
    #[serde(default)]
    pub guess: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrAnalysis {
    pub irr: Rate,
    pub npv_at_irr: Money,
    pub net_cash: Money,
    pub periods: usize,
}

pub fn calculate_irr(input: &IrrInput) -> SimulationResult<ComputationOutput<IrrAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let rate = irr(&input.cash_flows, input.guess.unwrap_or(DEFAULT_GUESS))?;
    let npv_at_irr = npv(rate, &input.cash_flows)?;
    if rate <= RATE_FLOOR {
        warnings.push("IRR sits on the -99% floor; the timeline barely recovers any capital".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Internal rate of return (Newton-Raphson with bisection fallback)",
        input,
        warnings,
        elapsed,
        IrrAnalysis {
            irr: rate,
            npv_at_irr,
            net_cash: input.cash_flows.iter().copied().sum(),
            periods: input.cash_flows.len(),
        },
    ))
}

/// Payment (PMT), spreadsheet sign convention: a positive present value
/// yields a negative payment.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> SimulationResult<Money> {
    if nper == 0 {
        return Err(SimulationError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r
        .checked_powu(u64::from(nper))
        .ok_or_else(|| SimulationError::DivisionByZero {
            context: "PMT compounding factor overflow".into(),
        })?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(SimulationError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    present_value
        .checked_mul(factor)
        .and_then(|compounded| compounded.checked_add(future_value))
        .and_then(|owed| owed.checked_div(annuity_factor))
        .map(|payment| -payment)
        .ok_or_else(|| SimulationError::DivisionByZero {
            context: "PMT payment overflow".into(),
        })
}

fn newton_raphson(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    let mut rate = guess;

    for _ in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_and_derivative(cash_flows, rate)?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Some(rate);
        }
        if dnpv.is_zero() {
            return None;
        }

        let next = (rate - npv_val.checked_div(dnpv)?).clamp(RATE_FLOOR, RATE_CEILING);
        if (next - rate).abs() < STEP_THRESHOLD {
            // Stalled on a clamp or a flat region without reaching the root
            return None;
        }
        rate = next;
    }

    None
}

fn bisection(cash_flows: &[Money]) -> SimulationResult<Rate> {
    let samples: Vec<(Rate, Money)> = BRACKET_GRID
        .iter()
        .filter_map(|&r| npv_and_derivative(cash_flows, r).map(|(v, _)| (r, v)))
        .collect();

    let bracket = samples.windows(2).find_map(|pair| {
        let (lo, f_lo) = pair[0];
        let (hi, f_hi) = pair[1];
        if f_lo.is_zero() {
            Some((lo, lo, f_lo))
        } else if f_lo.is_sign_negative() != f_hi.is_sign_negative() {
            Some((lo, hi, f_lo))
        } else {
            None
        }
    });

    let Some((mut lo, mut hi, mut f_lo)) = bracket else {
        return Err(SimulationError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: MAX_IRR_ITERATIONS,
            last_delta: samples.last().map(|(_, v)| *v).unwrap_or(Decimal::MAX),
        });
    };
    if lo == hi {
        return Ok(lo);
    }

    let mut last_delta = f_lo;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let Some((f_mid, _)) = npv_and_derivative(cash_flows, mid) else {
            break;
        };
        last_delta = f_mid;

        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo).abs() < STEP_THRESHOLD {
            return Ok(mid);
        }
        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(SimulationError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta,
    })
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
/// Returns `None` when a discount factor overflows.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^-t

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}
