pub mod error;
pub mod financing;
pub mod simulation;
pub mod tax;
pub mod time_value;
pub mod types;

pub use error::SimulationError;
pub use simulation::{simulate, Projection, SimulationParameters};
pub use types::*;

/// Standard result type for all simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
