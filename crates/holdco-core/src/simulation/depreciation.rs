use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::params::SimulationParameters;
use crate::types::*;

/// Asset classes depreciated on their own straight-line schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Building share of acquisition cost plus notary fees
    Building,
    Works,
    Furniture,
}

/// One straight-line component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationComponent {
    pub asset_class: AssetClass,
    pub base: Money,
    pub duration_years: Years,
}

impl DepreciationComponent {
    /// Charge for `year` (1-based). The last year takes the remainder so the
    /// component sums exactly to its base.
    pub fn charge(&self, year: Years) -> Money {
        if self.duration_years == 0 || year == 0 || year > self.duration_years {
            return Decimal::ZERO;
        }
        let annual = self.base / Decimal::from(self.duration_years);
        if year == self.duration_years {
            self.base - annual * Decimal::from(self.duration_years - 1)
        } else {
            annual
        }
    }
}

/// A year's depreciation by component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationCharge {
    pub building: Money,
    pub works: Money,
    pub furniture: Money,
}

impl DepreciationCharge {
    pub fn total(&self) -> Money {
        self.building + self.works + self.furniture
    }
}

/// The three components, fixed at acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationPlan {
    pub building: DepreciationComponent,
    pub works: DepreciationComponent,
    pub furniture: DepreciationComponent,
}

impl DepreciationPlan {
    pub fn from_parameters(params: &SimulationParameters) -> Self {
        let building_share = Decimal::ONE - pct(params.land_share_pct);
        DepreciationPlan {
            building: DepreciationComponent {
                asset_class: AssetClass::Building,
                base: (params.acquisition_cost + params.notary_fees) * building_share,
                duration_years: params.building_depreciation_years,
            },
            works: DepreciationComponent {
                asset_class: AssetClass::Works,
                base: params.renovation_cost,
                duration_years: params.works_depreciation_years,
            },
            furniture: DepreciationComponent {
                asset_class: AssetClass::Furniture,
                base: params.furniture_value,
                duration_years: params.furniture_depreciation_years,
            },
        }
    }

    pub fn charge_for_year(&self, year: Years) -> DepreciationCharge {
        DepreciationCharge {
            building: self.building.charge(year),
            works: self.works.charge(year),
            furniture: self.furniture.charge(year),
        }
    }

    /// Sum of the depreciable bases.
    pub fn total_base(&self) -> Money {
        self.building.base + self.works.base + self.furniture.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params() -> SimulationParameters {
        SimulationParameters {
            acquisition_cost: dec!(200000),
            notary_fees: dec!(16000),
            renovation_cost: dec!(30000),
            furniture_value: dec!(15000),
            land_share_pct: dec!(15),
            building_depreciation_years: 30,
            works_depreciation_years: 15,
            furniture_depreciation_years: 7,
            ..Default::default()
        }
    }

    #[test]
    fn test_building_base_excludes_land() {
        let plan = DepreciationPlan::from_parameters(&params());
        assert_eq!(plan.building.base, dec!(183600));
        assert_eq!(plan.building.charge(1), dec!(6120));
    }

    #[test]
    fn test_components_stop_after_duration() {
        let plan = DepreciationPlan::from_parameters(&params());
        let y7 = plan.charge_for_year(7);
        assert!(y7.furniture > Decimal::ZERO);
        let y8 = plan.charge_for_year(8);
        assert_eq!(y8.furniture, Decimal::ZERO);
        assert_eq!(y8.works, dec!(2000));
        let y31 = plan.charge_for_year(31);
        assert_eq!(y31.total(), Decimal::ZERO);
    }

    #[test]
    fn test_cumulative_equals_base_exactly() {
        let component = DepreciationComponent {
            asset_class: AssetClass::Furniture,
            base: dec!(200),
            duration_years: 3,
        };
        let total: Decimal = (1..=10).map(|y| component.charge(y)).sum();
        assert_eq!(total, dec!(200));
    }

    #[test]
    fn test_zero_duration_disables_component() {
        let mut p = params();
        p.works_depreciation_years = 0;
        let plan = DepreciationPlan::from_parameters(&p);
        assert_eq!(plan.charge_for_year(1).works, Decimal::ZERO);
    }
}
