//! Annual fiscal and cash-flow projection of the holding vehicle.
//!
//! The run is a fold of [`state::advance_year`] over the simulated years:
//! each step takes the previous [`state::SimulationState`] by reference and
//! returns the next one together with that year's [`state::YearRecord`].

pub mod depreciation;
pub mod exit;
pub mod params;
pub mod projection;
pub mod state;

pub use params::SimulationParameters;
pub use projection::{run, simulate, LedgerEntry, Projection, ProjectionSummary};
pub use state::{LoanPhase, YearRecord};
