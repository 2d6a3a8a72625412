use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate(input_json: String) -> NapiResult<String> {
    let input: holdco_core::simulation::SimulationParameters =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = holdco_core::simulation::simulate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulation_summary(input_json: String) -> NapiResult<String> {
    let input: holdco_core::simulation::SimulationParameters =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let (projection, _) = holdco_core::simulation::run(&input).map_err(to_napi_error)?;
    serde_json::to_string(&projection.summary()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: holdco_core::financing::amortization::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = holdco_core::financing::amortization::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn internal_rate_of_return(input_json: String) -> NapiResult<String> {
    let input: holdco_core::time_value::IrrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = holdco_core::time_value::calculate_irr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

#[napi]
pub fn corporate_tax(input_json: String) -> NapiResult<String> {
    let input: holdco_core::tax::corporate::CorporateTaxInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        holdco_core::tax::corporate::calculate_corporate_tax(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn capital_gains_tax(input_json: String) -> NapiResult<String> {
    let input: holdco_core::tax::capital_gains::CapitalGainInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = holdco_core::tax::capital_gains::calculate_capital_gains_tax(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
