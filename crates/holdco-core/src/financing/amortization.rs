use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value;
use crate::types::*;
use crate::SimulationResult;

/// Year-end balances below this are treated as fully repaid.
pub const BALANCE_EPSILON: Money = dec!(0.01);

/// Input for a fixed-rate, constant-payment loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Nominal annual rate, in percent
    pub annual_rate_pct: Percent,
    pub term_years: Years,
}

/// One year of the amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: Years,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

/// Annual amortization schedule, one entry per loan year starting at year 1.
///
/// Empty when there is no loan to amortize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub years: Vec<AmortizationYear>,
}

impl AmortizationSchedule {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn term_years(&self) -> Years {
        self.years.len() as Years
    }

    pub fn year(&self, year: Years) -> Option<&AmortizationYear> {
        if year == 0 {
            return None;
        }
        self.years.get((year - 1) as usize)
    }

    /// Interest paid in `year`; zero outside the loan term.
    pub fn interest(&self, year: Years) -> Money {
        self.year(year).map_or(Decimal::ZERO, |y| y.interest)
    }

    /// Principal repaid in `year`; zero outside the loan term.
    pub fn principal_repaid(&self, year: Years) -> Money {
        self.year(year).map_or(Decimal::ZERO, |y| y.principal)
    }

    /// Outstanding balance at the end of `year`; zero once the loan is over.
    pub fn remaining_balance(&self, year: Years) -> Money {
        self.year(year).map_or(Decimal::ZERO, |y| y.remaining_balance)
    }

    pub fn total_interest(&self) -> Money {
        self.years.iter().map(|y| y.interest).sum()
    }

    pub fn total_principal(&self) -> Money {
        self.years.iter().map(|y| y.principal).sum()
    }
}

/// Build the annual schedule of a constant-payment loan.
///
/// Any non-positive input, or a rate the annuity formula cannot handle,
/// yields an empty schedule rather than an error.
pub fn build_schedule(principal: Money, annual_rate_pct: Percent, term_years: Years) -> AmortizationSchedule {
    if principal <= Decimal::ZERO || annual_rate_pct <= Decimal::ZERO || term_years == 0 {
        return AmortizationSchedule::default();
    }

    let monthly_rate = pct(annual_rate_pct) / dec!(12);
    let total_months = term_years * 12;
    let monthly_payment = match time_value::pmt(monthly_rate, total_months, principal, Decimal::ZERO) {
        Ok(p) => -p,
        Err(_) => return AmortizationSchedule::default(),
    };

    let mut years: Vec<AmortizationYear> = (1..=term_years)
        .map(|year| AmortizationYear {
            year,
            interest: Decimal::ZERO,
            principal: Decimal::ZERO,
            remaining_balance: Decimal::ZERO,
        })
        .collect();
    let mut balance = principal;

    for month in 1..=total_months {
        let bucket = &mut years[((month - 1) / 12) as usize];
        let interest = balance * monthly_rate;
        let repaid = monthly_payment - interest;
        balance -= repaid;

        bucket.interest += interest;
        bucket.principal += repaid;
        bucket.remaining_balance = if balance > BALANCE_EPSILON {
            balance
        } else {
            Decimal::ZERO
        };
    }

    AmortizationSchedule {
        monthly_payment,
        years,
    }
}

/// Build a loan schedule wrapped in the standard output envelope.
pub fn amortize(terms: &LoanTerms) -> SimulationResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = build_schedule(terms.principal, terms.annual_rate_pct, terms.term_years);
    if schedule.is_empty() {
        warnings.push(
            "No amortization: principal, rate and term must all be positive".into(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Constant-payment loan amortization (monthly compounding, annual buckets)",
        terms,
        warnings,
        elapsed,
        schedule,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_one_year_loan() {
        let sched = build_schedule(dec!(12000), dec!(12), 1);
        assert_eq!(sched.term_years(), 1);
        assert!((sched.monthly_payment - dec!(1066.19)).abs() < dec!(0.01));

        let y1 = sched.year(1).unwrap();
        // 12 * 1066.1855 - 12000
        assert!((y1.interest - dec!(794.22)).abs() < dec!(0.01));
        assert!((y1.principal - dec!(12000)).abs() < dec!(0.01));
        assert_eq!(y1.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_principal_sums_to_loan() {
        let sched = build_schedule(dec!(250000), dec!(3.5), 20);
        assert_eq!(sched.years.len(), 20);
        assert!((sched.total_principal() - dec!(250000)).abs() < dec!(0.01));
        assert_eq!(sched.remaining_balance(20), Decimal::ZERO);
    }

    #[test]
    fn test_balance_non_increasing() {
        let sched = build_schedule(dec!(180000), dec!(4.1), 25);
        let mut previous = dec!(180000);
        for y in &sched.years {
            assert!(y.remaining_balance <= previous);
            previous = y.remaining_balance;
        }
    }

    #[test]
    fn test_interest_declines_year_over_year() {
        let sched = build_schedule(dec!(100000), dec!(5), 10);
        for pair in sched.years.windows(2) {
            assert!(pair[1].interest < pair[0].interest);
            assert!(pair[1].principal > pair[0].principal);
        }
    }

    #[test]
    fn test_degenerate_inputs_yield_empty_schedule() {
        assert!(build_schedule(Decimal::ZERO, dec!(3), 20).is_empty());
        assert!(build_schedule(dec!(100000), Decimal::ZERO, 20).is_empty());
        assert!(build_schedule(dec!(100000), dec!(3), 0).is_empty());
        assert!(build_schedule(dec!(-5), dec!(3), 20).is_empty());
    }

    #[test]
    fn test_lookups_outside_term_are_zero() {
        let sched = build_schedule(dec!(50000), dec!(2), 5);
        assert_eq!(sched.interest(0), Decimal::ZERO);
        assert_eq!(sched.interest(6), Decimal::ZERO);
        assert_eq!(sched.principal_repaid(30), Decimal::ZERO);
        assert_eq!(sched.remaining_balance(6), Decimal::ZERO);
    }

    #[test]
    fn test_amortize_envelope_warns_on_empty() {
        let out = amortize(&LoanTerms {
            principal: dec!(1000),
            annual_rate_pct: Decimal::ZERO,
            term_years: 5,
        })
        .unwrap();
        assert!(out.result.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }
}
