//! Equity and debt valuation engines for a levered firm.
//!
//! Both models share the same decomposition: a claim is worth its no-default
//! perpetuity value plus a correction paid at the first passage of cash flow
//! through the trigger boundary, priced with [`BarrierKernel`](crate::barrier::BarrierKernel).

#[cfg(feature = "liquidation")]
pub mod liquidation;

#[cfg(feature = "renegotiation")]
pub mod renegotiation;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CapStructError;
use crate::types::{checked_add, checked_div, checked_mul, Money, Rate};
use crate::CapStructResult;

/// Debt-to-firm value above which an analysis flags the structure.
pub const HIGH_LEVERAGE_THRESHOLD: Rate = dec!(0.90);

/// Hitting-claim value above which an analysis flags default as likely.
pub const HIGH_DEFAULT_CLAIM_THRESHOLD: Decimal = dec!(0.5);

// ---------------------------------------------------------------------------
// Shared output types
// ---------------------------------------------------------------------------

/// All claim values at one cash-flow level. `firm == equity + debt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimValues {
    pub cash_flow: Money,
    pub equity: Money,
    pub debt: Money,
    pub firm: Money,
    /// Price of one unit paid when cash flow first hits the trigger.
    pub default_claim: Decimal,
}

impl ClaimValues {
    pub(crate) fn new(
        cash_flow: Money,
        equity: Money,
        debt: Money,
        default_claim: Decimal,
    ) -> CapStructResult<Self> {
        Ok(Self {
            cash_flow,
            equity,
            debt,
            firm: checked_add(equity, debt, "firm value")?,
            default_claim,
        })
    }
}

/// Evenly spaced cash-flow levels for a claims curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSpec {
    pub from: Money,
    pub to: Money,
    pub points: u32,
}

impl Default for CurveSpec {
    fn default() -> Self {
        Self {
            from: dec!(0.5),
            to: dec!(4),
            points: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Inclusive grid of `points` levels from `from` to `to`.
pub fn cash_flow_grid(spec: &CurveSpec) -> CapStructResult<Vec<Money>> {
    if spec.points < 2 {
        return Err(CapStructError::InvalidInput {
            field: "curve.points".into(),
            reason: "A curve needs at least two points.".into(),
        });
    }
    if spec.from <= Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "curve.from".into(),
            reason: "Cash-flow levels must be positive.".into(),
        });
    }
    if spec.to <= spec.from {
        return Err(CapStructError::InvalidInput {
            field: "curve.to".into(),
            reason: "Curve end must exceed its start.".into(),
        });
    }

    let step = checked_div(spec.to - spec.from, Decimal::from(spec.points - 1), "curve step")?;
    let mut grid: Vec<Money> = (0..spec.points - 1)
        .map(|i| spec.from + step * Decimal::from(i))
        .collect();
    grid.push(spec.to);
    Ok(grid)
}

/// Promised yield `coupon / debt`.
pub fn debt_yield(coupon: Money, debt: Money) -> CapStructResult<Rate> {
    if debt.is_zero() {
        return Err(CapStructError::DivisionByZero {
            context: "debt yield (debt value is zero)".into(),
        });
    }
    checked_div(coupon, debt, "debt yield")
}

/// Yield over the riskless rate.
pub fn credit_spread(coupon: Money, debt: Money, r_free: Rate) -> CapStructResult<Rate> {
    Ok(debt_yield(coupon, debt)? - r_free)
}

/// Debt share of total firm value.
pub fn leverage(debt: Money, firm: Money) -> CapStructResult<Rate> {
    if firm.is_zero() {
        return Err(CapStructError::DivisionByZero {
            context: "leverage (firm value is zero)".into(),
        });
    }
    checked_div(debt, firm, "leverage")
}

pub(crate) fn validate_coupon(coupon: Money) -> CapStructResult<()> {
    if coupon < Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "coupon".into(),
            reason: "Coupon must be non-negative.".into(),
        });
    }
    Ok(())
}

pub(crate) fn validate_cash_flow(cash_flow: Money) -> CapStructResult<()> {
    if cash_flow <= Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "cash_flow".into(),
            reason: "Cash flow must be positive.".into(),
        });
    }
    Ok(())
}

/// Flags shared by both analyses.
pub(crate) fn structure_warnings(claims: &ClaimValues, warnings: &mut Vec<String>) {
    if let Ok(lev) = leverage(claims.debt, claims.firm) {
        if lev > HIGH_LEVERAGE_THRESHOLD {
            match checked_mul(lev, dec!(100), "leverage percent") {
                Ok(pct) => warnings.push(format!("Debt is {pct:.1}% of firm value.")),
                Err(_) => warnings.push("Debt exceeds firm value many times over.".into()),
            }
        }
    }
    if claims.default_claim > HIGH_DEFAULT_CLAIM_THRESHOLD {
        warnings.push(format!(
            "Default claim value {:.4} exceeds {}: trigger is close to current cash flow.",
            claims.default_claim, HIGH_DEFAULT_CLAIM_THRESHOLD
        ));
    }
    if claims.equity < Decimal::ZERO {
        warnings.push(
            "Equity value is negative: the trigger lies below the optimal default level.".into(),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
