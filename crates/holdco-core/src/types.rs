use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Rates as typed by an operator, in fractions of 100 (5 = 5%).
/// Convert with [`pct`] before using them in arithmetic.
pub type Percent = Decimal;

/// Year counts
pub type Years = u32;

/// Largest monetary input accepted. Compounded over the longest horizon at
/// the highest growth rate, results stay well inside `Decimal` range.
pub const MAX_AMOUNT: Money = dec!(1000000000000);

/// Convert an operator-facing percentage into a decimal rate.
pub fn pct(value: Percent) -> Rate {
    value / dec!(100)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_converts_fraction_of_100() {
        assert_eq!(pct(dec!(3.5)), dec!(0.035));
        assert_eq!(pct(dec!(100)), Decimal::ONE);
        assert_eq!(pct(Decimal::ZERO), Decimal::ZERO);
    }
}
