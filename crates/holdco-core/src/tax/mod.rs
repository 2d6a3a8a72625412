pub mod capital_gains;
pub mod corporate;
pub mod schedule;

pub use schedule::TaxSchedule;
