use capstruct_core::{AssetDynamics, AssetDynamicsParams, RenegotiationClaims};
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Capital structure analyses
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_renegotiation(input_json: String) -> NapiResult<String> {
    let input: capstruct_core::claims::renegotiation::RenegotiationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capstruct_core::claims::renegotiation::analyze_renegotiation(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_liquidation(input_json: String) -> NapiResult<String> {
    let input: capstruct_core::claims::liquidation::LiquidationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capstruct_core::claims::liquidation::analyze_liquidation(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Point queries
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BoundaryQuery {
    dynamics: AssetDynamicsParams,
    coupon: Decimal,
}

#[derive(Serialize)]
struct BoundaryAnswer {
    coupon: Decimal,
    renegotiation_boundary: Decimal,
    beta2: Decimal,
}

/// Renegotiation trigger for a single coupon, without the full analysis.
#[napi]
pub fn renegotiation_boundary(input_json: String) -> NapiResult<String> {
    let query: BoundaryQuery = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let dynamics = AssetDynamics::try_from(query.dynamics).map_err(to_napi_error)?;
    let claims = RenegotiationClaims::new(&dynamics).map_err(to_napi_error)?;
    let boundary = claims
        .renegotiation_boundary(query.coupon)
        .map_err(to_napi_error)?;
    let answer = BoundaryAnswer {
        coupon: query.coupon,
        renegotiation_boundary: boundary,
        beta2: dynamics.beta2(),
    };
    serde_json::to_string(&answer).map_err(to_napi_error)
}
