//! Claims on a firm whose shareholders may force a renegotiation of the debt.
//!
//! At the trigger `x_R`, liquidation follows with probability `q`; otherwise
//! the parties renegotiate and shareholders keep a fraction `θ` of asset
//! value. Shareholders choose the trigger optimally, which gives the
//! closed-form boundary
//!
//! ```text
//! x_R(c) = (r − μ) · (c / r) · β2 / ((β2 − 1) · (1 − (1 − q)·θ))
//! ```
//!
//! and, with `p = (x / x_R)^β2`,
//!
//! ```text
//! D = c/r + p · (q·(1 − α)·V(x_R) + (1 − q)·(1 − θ)·V(x_R) − c/r)
//! E = V(x) − (1 − τ)·c/r − p · ((1 − (1 − q)·θ)·V(x_R) − (1 − τ)·c/r)
//! ```
//!
//! The boundary grows linearly with the coupon, so firm value has no
//! closed-form maximizer; [`RenegotiationClaims::max_coupon`] searches for it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{
    cash_flow_grid, credit_spread, debt_yield, leverage, structure_warnings, validate_cash_flow,
    validate_coupon, ClaimValues, CurveSpec,
};
use crate::asset_dynamics::{AssetDynamics, AssetDynamicsParams};
use crate::coupon_search::{maximize_coupon, CouponBracket, CouponOptimum};
use crate::error::CapStructError;
use crate::types::{
    checked_add, checked_div, checked_mul, checked_sub, with_metadata, ComputationOutput, Money,
    Rate,
};
use crate::CapStructResult;

/// Upper coupon bracket is pulled this fraction inside the coupon at which
/// the trigger reaches current cash flow.
const TRIGGER_MARGIN: Decimal = dec!(0.999999);

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Valuation engine for the strategic-renegotiation model.
#[derive(Debug, Clone, Copy)]
pub struct RenegotiationClaims<'a> {
    dynamics: &'a AssetDynamics,
    q: Rate,
    theta: Rate,
}

impl<'a> RenegotiationClaims<'a> {
    /// Fails when `q` or `theta` is missing, or when shareholders would keep
    /// the whole firm in renegotiation (`q = 0`, `θ = 1`).
    pub fn new(dynamics: &'a AssetDynamics) -> CapStructResult<Self> {
        let (q, theta) = dynamics.renegotiation_terms()?;
        let engine = Self { dynamics, q, theta };
        if engine.equity_share() <= Decimal::ZERO {
            return Err(CapStructError::InvalidInput {
                field: "theta".into(),
                reason: "Shareholders cannot capture the whole firm in renegotiation.".into(),
            });
        }
        Ok(engine)
    }

    pub fn dynamics(&self) -> &AssetDynamics {
        self.dynamics
    }

    /// `1 − (1 − q)·θ`: the fraction of asset value shareholders give up at
    /// the trigger.
    pub fn equity_share(&self) -> Rate {
        Decimal::ONE - (Decimal::ONE - self.q) * self.theta
    }

    /// Debtholders' expected recovery as a fraction of asset value at the
    /// trigger.
    pub fn debt_recovery_share(&self) -> Rate {
        self.q * (Decimal::ONE - self.dynamics.alpha())
            + (Decimal::ONE - self.q) * (Decimal::ONE - self.theta)
    }

    /// Endogenous trigger level for `coupon`. Zero coupon means no trigger.
    pub fn renegotiation_boundary(&self, coupon: Money) -> CapStructResult<Money> {
        validate_coupon(coupon)?;
        let ctx = "renegotiation boundary";
        let d = self.dynamics;
        let beta2 = d.beta2();
        let numerator = checked_mul(
            checked_mul(
                checked_sub(d.r_free(), d.drift(), ctx)?,
                d.risk_free_debt(coupon)?,
                ctx,
            )?,
            beta2,
            ctx,
        )?;
        let denominator = checked_mul(beta2 - Decimal::ONE, self.equity_share(), ctx)?;
        checked_div(numerator, denominator, ctx)
    }

    pub fn debt(&self, coupon: Money, cash_flow: Money) -> CapStructResult<Money> {
        Ok(self.claims(coupon, cash_flow)?.debt)
    }

    pub fn equity(&self, coupon: Money, cash_flow: Money) -> CapStructResult<Money> {
        Ok(self.claims(coupon, cash_flow)?.equity)
    }

    pub fn firm(&self, coupon: Money, cash_flow: Money) -> CapStructResult<Money> {
        Ok(self.claims(coupon, cash_flow)?.firm)
    }

    /// Equity, debt and firm value from a single boundary and kernel
    /// evaluation.
    pub fn claims(&self, coupon: Money, cash_flow: Money) -> CapStructResult<ClaimValues> {
        validate_cash_flow(cash_flow)?;
        let boundary = self.renegotiation_boundary(coupon)?;
        let d = self.dynamics;

        // No trigger: the firm is unlevered (or the coupon is below Decimal precision).
        if boundary.is_zero() {
            return ClaimValues::new(cash_flow, d.value(cash_flow)?, Decimal::ZERO, Decimal::ZERO);
        }

        let ctx = "renegotiation claims";
        let p = d.kernel().default_claim_value(cash_flow, boundary)?;
        let risk_free_debt = d.risk_free_debt(coupon)?;
        let after_tax_burden = checked_mul(Decimal::ONE - d.tau(), risk_free_debt, ctx)?;
        let boundary_value = d.value(boundary)?;

        let recovery = checked_mul(self.debt_recovery_share(), boundary_value, ctx)?;
        let debt_shortfall = checked_mul(p, checked_sub(recovery, risk_free_debt, ctx)?, ctx)?;
        let debt = checked_add(risk_free_debt, debt_shortfall, ctx)?;

        let surrendered = checked_mul(self.equity_share(), boundary_value, ctx)?;
        let option_to_default =
            checked_mul(p, checked_sub(surrendered, after_tax_burden, ctx)?, ctx)?;
        let no_default = checked_sub(d.value(cash_flow)?, after_tax_burden, ctx)?;
        let equity = checked_sub(no_default, option_to_default, ctx)?;

        ClaimValues::new(cash_flow, equity, debt, p)
    }

    /// [`claims`](Self::claims) at each cash-flow level.
    pub fn curve(
        &self,
        coupon: Money,
        cash_flows: &[Money],
    ) -> CapStructResult<Vec<ClaimValues>> {
        cash_flows.iter().map(|x| self.claims(coupon, *x)).collect()
    }

    /// `[0, min(r · V(x), x / k))` where `x_R = k · c`. The second bound keeps
    /// the trigger below current cash flow. Both ends scale with `x`, as does
    /// the optimal coupon.
    pub fn coupon_bracket(&self, cash_flow: Money) -> CapStructResult<CouponBracket> {
        validate_cash_flow(cash_flow)?;
        let ctx = "renegotiation coupon bracket";
        let d = self.dynamics;
        let per_unit_coupon = self.renegotiation_boundary(Decimal::ONE)?;
        let serviceable = checked_mul(d.r_free(), d.value(cash_flow)?, ctx)?;
        let before_trigger = checked_mul(
            checked_div(cash_flow, per_unit_coupon, ctx)?,
            TRIGGER_MARGIN,
            ctx,
        )?;
        Ok(CouponBracket {
            lower: Decimal::ZERO,
            upper: serviceable.min(before_trigger),
        })
    }

    /// Coupon maximizing total firm value at the current cash flow.
    pub fn max_coupon(&self, cash_flow: Money) -> CapStructResult<CouponOptimum> {
        let bracket = self.coupon_bracket(cash_flow)?;
        maximize_coupon(|coupon| self.firm(coupon, cash_flow), bracket)
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Input for a renegotiation-model valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenegotiationInput {
    /// Must carry `q` and either `theta` or `eta`.
    pub dynamics: AssetDynamicsParams,
    /// Current cash-flow level.
    pub cash_flow: Money,
    /// Coupon to value. Solved for when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Money>,
    /// Claims curve over a cash-flow grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<CurveSpec>,
}

/// Output of a renegotiation-model valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenegotiationOutput {
    pub coupon: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<CouponOptimum>,
    pub renegotiation_boundary: Money,
    pub equity: Money,
    pub debt: Money,
    pub firm_value: Money,
    pub default_claim: Decimal,
    pub debt_yield: Option<Rate>,
    pub credit_spread: Option<Rate>,
    pub leverage: Option<Rate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub curve: Vec<ClaimValues>,
}

/// Optimal (or given) capital structure under strategic renegotiation.
pub fn analyze_renegotiation(
    input: &RenegotiationInput,
) -> CapStructResult<ComputationOutput<RenegotiationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let dynamics = AssetDynamics::try_from(input.dynamics.clone())?;
    validate_input(input)?;
    let engine = RenegotiationClaims::new(&dynamics)?;

    let (coupon, search) = match input.coupon {
        Some(c) => (c, None),
        None => {
            let opt = engine.max_coupon(input.cash_flow)?;
            if !opt.status.is_interior() {
                warnings.push(format!(
                    "Coupon search ended at the {:?} of [{}, {}]; not a stationary optimum.",
                    opt.status, opt.bracket.lower, opt.bracket.upper
                ));
            }
            (opt.coupon, Some(opt))
        }
    };

    let boundary = engine.renegotiation_boundary(coupon)?;
    let claims = engine.claims(coupon, input.cash_flow)?;
    structure_warnings(&claims, &mut warnings);

    let curve = match &input.curve {
        Some(spec) => {
            let grid = cash_flow_grid(spec)?;
            let (live, triggered): (Vec<Money>, Vec<Money>) =
                grid.into_iter().partition(|x| *x >= boundary);
            if !triggered.is_empty() {
                warnings.push(format!(
                    "{} curve points below the renegotiation boundary omitted.",
                    triggered.len()
                ));
            }
            engine.curve(coupon, &live)?
        }
        None => Vec::new(),
    };

    let output = RenegotiationOutput {
        coupon,
        search,
        renegotiation_boundary: boundary,
        equity: claims.equity,
        debt: claims.debt,
        firm_value: claims.firm,
        default_claim: claims.default_claim,
        debt_yield: debt_yield(coupon, claims.debt).ok(),
        credit_spread: credit_spread(coupon, claims.debt, dynamics.r_free()).ok(),
        leverage: leverage(claims.debt, claims.firm).ok(),
        curve,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "dynamics": dynamics,
        "beta2": dynamics.beta2().to_string(),
        "equity_share_at_trigger": engine.equity_share().to_string(),
        "debt_recovery_share": engine.debt_recovery_share().to_string(),
        "cash_flow": input.cash_flow.to_string(),
        "coupon_solved": input.coupon.is_none(),
    });

    Ok(with_metadata(
        "Structural claims with strategic debt renegotiation (endogenous trigger)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &RenegotiationInput) -> CapStructResult<()> {
    validate_cash_flow(input.cash_flow)?;
    if let Some(c) = input.coupon {
        validate_coupon(c)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
