//! Bounded golden-section search for the value-maximizing coupon.
//!
//! The objective must be unimodal or monotone on the bracket. Renegotiation
//! firm value rises then falls in the coupon; liquidation firm value is affine
//! in it, so its maximum sits at an end. The caller supplies the bracket and
//! the search reports whether the optimum is interior or pinned to one of its
//! ends. It fails with `ConvergenceFailure` if the bracket has not narrowed to
//! `SEARCH_TOLERANCE` of its starting width within `MAX_SEARCH_ITERATIONS`.
//!
//! The stopping rule is relative, so scaling the bracket by `k` scales the
//! returned coupon by `k`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CapStructError;
use crate::types::Money;
use crate::CapStructResult;

/// Final bracket width as a fraction of the starting width.
pub const SEARCH_TOLERANCE: Decimal = dec!(0.000000001);

/// Iteration budget; golden-section needs ~44 steps to shrink a bracket by
/// `SEARCH_TOLERANCE`.
pub const MAX_SEARCH_ITERATIONS: u32 = 200;

/// 1/φ, the golden-section shrink factor.
const INV_PHI: Decimal = dec!(0.6180339887498948482045868344);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the maximizer ended up relative to its bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Stationary point strictly inside the bracket.
    Interior,
    /// Objective decreasing across the bracket; result is the lower end.
    LowerBound,
    /// Objective increasing across the bracket; result is the upper end.
    UpperBound,
}

impl SearchStatus {
    pub fn is_interior(&self) -> bool {
        matches!(self, SearchStatus::Interior)
    }
}

/// Admissible coupon range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouponBracket {
    pub lower: Money,
    pub upper: Money,
}

/// Result of a coupon search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponOptimum {
    pub coupon: Money,
    /// Objective value at `coupon`.
    pub firm_value: Money,
    pub iterations: u32,
    pub status: SearchStatus,
    pub bracket: CouponBracket,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Maximize `objective` over `bracket`.
pub fn maximize_coupon<F>(
    objective: F,
    bracket: CouponBracket,
) -> CapStructResult<CouponOptimum>
where
    F: Fn(Money) -> CapStructResult<Money>,
{
    validate_bracket(&bracket)?;

    let tolerance = SEARCH_TOLERANCE * (bracket.upper - bracket.lower);
    let mut lo = bracket.lower;
    let mut hi = bracket.upper;
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let mut f1 = objective(x1)?;
    let mut f2 = objective(x2)?;

    let mut iterations = 0u32;
    while hi - lo > tolerance {
        if iterations >= MAX_SEARCH_ITERATIONS {
            return Err(CapStructError::ConvergenceFailure {
                function: "maximize_coupon".into(),
                iterations,
                last_delta: hi - lo,
            });
        }
        iterations += 1;

        if f1 < f2 {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = objective(x2)?;
        } else {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = objective(x1)?;
        }
    }

    let mid = lo + (hi - lo) / dec!(2);
    let (coupon, status) = if bracket.upper - mid <= tolerance {
        (bracket.upper, SearchStatus::UpperBound)
    } else if mid - bracket.lower <= tolerance {
        (bracket.lower, SearchStatus::LowerBound)
    } else {
        (mid, SearchStatus::Interior)
    };
    let firm_value = objective(coupon)?;

    if status.is_interior() {
        tracing::debug!(iterations, %coupon, %firm_value, "coupon search converged");
    } else {
        tracing::warn!(
            iterations,
            %coupon,
            ?status,
            "coupon search optimum pinned to bracket edge"
        );
    }

    Ok(CouponOptimum {
        coupon,
        firm_value,
        iterations,
        status,
        bracket,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_bracket(bracket: &CouponBracket) -> CapStructResult<()> {
    if bracket.lower < Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "bracket.lower".into(),
            reason: "Coupon bracket must start at a non-negative coupon.".into(),
        });
    }
    if bracket.upper <= bracket.lower {
        return Err(CapStructError::FinancialImpossibility(format!(
            "Empty coupon bracket [{}, {}]: no admissible coupon keeps the firm above its default trigger.",
            bracket.lower, bracket.upper
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
