use napi::Result as NapiResult;
use napi_derive::napi;

use realty_finance_core::cet::effective_cost;
use realty_finance_core::{breakeven, comparison, consortium, financing};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[napi]
pub fn financing_schedule(input_json: String) -> NapiResult<String> {
    let input: financing::amortization::FinancingPlan =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = financing::amortization::analyze_financing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn consortium_schedule(input_json: String) -> NapiResult<String> {
    let input: consortium::installments::ConsortiumPlan =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = consortium::installments::analyze_consortium(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Cost and comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn cet(input_json: String) -> NapiResult<String> {
    let input: effective_cost::CetInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = effective_cost::analyze_cet(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn breakeven_investment(input_json: String) -> NapiResult<String> {
    let input: breakeven::BreakevenInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = breakeven::analyze_breakeven(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_plans(input_json: String) -> NapiResult<String> {
    let input: comparison::plans::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::plans::compare(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
