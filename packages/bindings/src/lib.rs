use napi::Result as NapiResult;
use napi_derive::napi;

use deal_engine_core::syndication::amortization::{self, LoanScheduleInput};
use deal_engine_core::syndication::{self, DealInputs, WaterfallPreset};
use deal_engine_core::time_value::{self, CashFlowReturnsInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Syndication
// ---------------------------------------------------------------------------

/// Validate and analyse a deal. Missing fields take the default deal's values.
#[napi]
pub fn analyze_syndication(input_json: String) -> NapiResult<String> {
    let input = DealInputs::from_json(&input_json).map_err(to_napi_error)?;
    let output = syndication::run_syndication(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_deal_inputs() -> NapiResult<String> {
    serde_json::to_string(&DealInputs::default()).map_err(to_napi_error)
}

/// Overwrite the tier fields of a deal with a preset
/// (`conservative`, `standard` or `aggressive`).
#[napi]
pub fn apply_waterfall_preset(input_json: String, preset: String) -> NapiResult<String> {
    let mut input = DealInputs::from_json(&input_json).map_err(to_napi_error)?;
    let preset: WaterfallPreset =
        serde_json::from_value(serde_json::Value::String(preset)).map_err(to_napi_error)?;
    preset.apply(&mut input);
    serde_json::to_string(&input).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns and debt
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_irr(input_json: String) -> NapiResult<String> {
    let input: CashFlowReturnsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = time_value::analyze_cash_flows(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn loan_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::build_loan_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
