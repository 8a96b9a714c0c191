use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CapStructError;
use crate::CapStructResult;

/// All monetary values (cash flows, claim values, coupons). Wraps Decimal to
/// prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.04 = 4%). Never as percentages.
pub type Rate = Decimal;

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

// ---------------------------------------------------------------------------
// Checked arithmetic
// ---------------------------------------------------------------------------

fn overflow(op: &str, a: Decimal, b: Decimal, context: &str) -> CapStructError {
    CapStructError::ArithmeticOverflow {
        context: format!("{context} ({a} {op} {b})"),
    }
}

pub(crate) fn checked_add(a: Decimal, b: Decimal, context: &str) -> CapStructResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow("+", a, b, context))
}

pub(crate) fn checked_sub(a: Decimal, b: Decimal, context: &str) -> CapStructResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow("-", a, b, context))
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal, context: &str) -> CapStructResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow("*", a, b, context))
}

/// A zero divisor is reported as overflow too: it only reaches here when a
/// tiny positive input has been rounded away.
pub(crate) fn checked_div(a: Decimal, b: Decimal, context: &str) -> CapStructResult<Decimal> {
    a.checked_div(b).ok_or_else(|| overflow("/", a, b, context))
}
