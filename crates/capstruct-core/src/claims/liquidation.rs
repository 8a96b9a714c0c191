//! Claims on a firm that is liquidated the first time its cash flow falls to an
//! exogenous boundary `x_L`.
//!
//! With `p = (x / x_L)^β2`, `V` the after-tax perpetuity value and `c` the
//! coupon:
//!
//! ```text
//! D = c/r + p · ((1 − α)·V(x_L) − c/r)
//! E = V(x) − (1 − τ)·c/r − p · (V(x_L) − (1 − τ)·c/r)
//! ```
//!
//! Because the boundary does not move with the coupon, firm value is affine in
//! the coupon and the value-maximizing coupon always sits on an edge of its
//! admissible range.

use rust_decimal::Decimal;
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
    checked_add, checked_mul, checked_sub, with_metadata, ComputationOutput, Money, Rate,
};
use crate::CapStructResult;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Valuation engine for the immediate-liquidation model.
#[derive(Debug, Clone, Copy)]
pub struct LiquidationClaims<'a> {
    dynamics: &'a AssetDynamics,
}

impl<'a> LiquidationClaims<'a> {
    pub fn new(dynamics: &'a AssetDynamics) -> Self {
        Self { dynamics }
    }

    pub fn dynamics(&self) -> &AssetDynamics {
        self.dynamics
    }

    pub fn debt(
        &self,
        coupon: Money,
        cash_flow: Money,
        debt_liquidation: Money,
    ) -> CapStructResult<Money> {
        let p = self.default_claim(coupon, cash_flow, debt_liquidation)?;
        self.debt_given_claim(coupon, debt_liquidation, p)
    }

    pub fn equity(
        &self,
        coupon: Money,
        cash_flow: Money,
        debt_liquidation: Money,
    ) -> CapStructResult<Money> {
        let p = self.default_claim(coupon, cash_flow, debt_liquidation)?;
        self.equity_given_claim(coupon, cash_flow, debt_liquidation, p)
    }

    pub fn firm(
        &self,
        coupon: Money,
        cash_flow: Money,
        debt_liquidation: Money,
    ) -> CapStructResult<Money> {
        Ok(self.claims(coupon, cash_flow, debt_liquidation)?.firm)
    }

    /// Equity, debt and firm value from a single kernel evaluation.
    pub fn claims(
        &self,
        coupon: Money,
        cash_flow: Money,
        debt_liquidation: Money,
    ) -> CapStructResult<ClaimValues> {
        let p = self.default_claim(coupon, cash_flow, debt_liquidation)?;
        ClaimValues::new(
            cash_flow,
            self.equity_given_claim(coupon, cash_flow, debt_liquidation, p)?,
            self.debt_given_claim(coupon, debt_liquidation, p)?,
            p,
        )
    }

    /// [`claims`](Self::claims) at each cash-flow level.
    pub fn curve(
        &self,
        coupon: Money,
        cash_flows: &[Money],
        debt_liquidation: Money,
    ) -> CapStructResult<Vec<ClaimValues>> {
        cash_flows
            .iter()
            .map(|x| self.claims(coupon, *x, debt_liquidation))
            .collect()
    }

    /// `[0, r · V(x)]`: a coupon above the riskless yield on the unlevered
    /// firm cannot be serviced.
    pub fn coupon_bracket(&self, cash_flow: Money) -> CapStructResult<CouponBracket> {
        validate_cash_flow(cash_flow)?;
        let d = self.dynamics;
        Ok(CouponBracket {
            lower: Decimal::ZERO,
            upper: checked_mul(d.r_free(), d.value(cash_flow)?, "serviceable coupon")?,
        })
    }

    /// Coupon maximizing firm value for a fixed liquidation boundary.
    ///
    /// Reports `UpperBound` whenever the tax shield is positive, since the
    /// objective is increasing in the coupon.
    pub fn max_coupon(
        &self,
        cash_flow: Money,
        debt_liquidation: Money,
    ) -> CapStructResult<CouponOptimum> {
        let bracket = self.coupon_bracket(cash_flow)?;
        maximize_coupon(
            |coupon| self.firm(coupon, cash_flow, debt_liquidation),
            bracket,
        )
    }

    fn default_claim(
        &self,
        coupon: Money,
        cash_flow: Money,
        debt_liquidation: Money,
    ) -> CapStructResult<Decimal> {
        validate_coupon(coupon)?;
        validate_cash_flow(cash_flow)?;
        self.dynamics
            .kernel()
            .default_claim_value(cash_flow, debt_liquidation)
    }

    fn debt_given_claim(
        &self,
        coupon: Money,
        debt_liquidation: Money,
        p: Decimal,
    ) -> CapStructResult<Money> {
        let ctx = "liquidation debt";
        let d = self.dynamics;
        let risk_free_debt = d.risk_free_debt(coupon)?;
        let recovery = checked_mul(Decimal::ONE - d.alpha(), d.value(debt_liquidation)?, ctx)?;
        let shortfall = checked_sub(recovery, risk_free_debt, ctx)?;
        checked_add(risk_free_debt, checked_mul(p, shortfall, ctx)?, ctx)
    }

    fn equity_given_claim(
        &self,
        coupon: Money,
        cash_flow: Money,
        debt_liquidation: Money,
        p: Decimal,
    ) -> CapStructResult<Money> {
        let ctx = "liquidation equity";
        let d = self.dynamics;
        let after_tax_burden = checked_mul(Decimal::ONE - d.tau(), d.risk_free_debt(coupon)?, ctx)?;
        let no_default = checked_sub(d.value(cash_flow)?, after_tax_burden, ctx)?;
        let at_liquidation = checked_sub(d.value(debt_liquidation)?, after_tax_burden, ctx)?;
        let option_to_default = checked_mul(p, at_liquidation, ctx)?;
        checked_sub(no_default, option_to_default, ctx)
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Input for a liquidation-model valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationInput {
    pub dynamics: AssetDynamicsParams,
    /// Current cash-flow level.
    pub cash_flow: Money,
    /// Exogenous liquidation boundary.
    pub debt_liquidation: Money,
    /// Coupon to value. Solved for when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Money>,
    /// Claims curve over a cash-flow grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<CurveSpec>,
}

/// Output of a liquidation-model valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationOutput {
    pub coupon: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<CouponOptimum>,
    pub debt_liquidation: Money,
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

/// Value equity and debt under immediate liquidation at an exogenous boundary.
pub fn analyze_liquidation(
    input: &LiquidationInput,
) -> CapStructResult<ComputationOutput<LiquidationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let dynamics = AssetDynamics::try_from(input.dynamics.clone())?;
    validate_input(input)?;
    let engine = LiquidationClaims::new(&dynamics);

    let (coupon, search) = match input.coupon {
        Some(c) => (c, None),
        None => {
            let opt = engine.max_coupon(input.cash_flow, input.debt_liquidation)?;
            if !opt.status.is_interior() {
                warnings.push(format!(
                    "Firm value is monotone in the coupon for a fixed liquidation boundary; \
                     optimum pinned to the {:?} of [{}, {}].",
                    opt.status, opt.bracket.lower, opt.bracket.upper
                ));
            }
            (opt.coupon, Some(opt))
        }
    };

    let claims = engine.claims(coupon, input.cash_flow, input.debt_liquidation)?;
    structure_warnings(&claims, &mut warnings);

    let curve = match &input.curve {
        Some(spec) => {
            let grid = cash_flow_grid(spec)?;
            let (live, defaulted): (Vec<Money>, Vec<Money>) =
                grid.into_iter().partition(|x| *x >= input.debt_liquidation);
            if !defaulted.is_empty() {
                warnings.push(format!(
                    "{} curve points below the liquidation boundary omitted.",
                    defaulted.len()
                ));
            }
            engine.curve(coupon, &live, input.debt_liquidation)?
        }
        None => Vec::new(),
    };

    let output = LiquidationOutput {
        coupon,
        search,
        debt_liquidation: input.debt_liquidation,
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
        "cash_flow": input.cash_flow.to_string(),
        "coupon_solved": input.coupon.is_none(),
    });

    Ok(with_metadata(
        "Structural claims with immediate liquidation at an exogenous boundary",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &LiquidationInput) -> CapStructResult<()> {
    validate_cash_flow(input.cash_flow)?;
    if input.debt_liquidation <= Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "debt_liquidation".into(),
            reason: "Liquidation boundary must be positive.".into(),
        });
    }
    if input.cash_flow < input.debt_liquidation {
        return Err(CapStructError::FinancialImpossibility(format!(
            "Cash flow {} is already below the liquidation boundary {}.",
            input.cash_flow, input.debt_liquidation
        )));
    }
    if let Some(c) = input.coupon {
        validate_coupon(c)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon_search::SearchStatus;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn base_dynamics() -> AssetDynamics {
        AssetDynamics::new(dec!(0.01), dec!(0.25), dec!(0.04), dec!(0.15), dec!(0.4)).unwrap()
    }

    fn base_params() -> AssetDynamicsParams {
        AssetDynamicsParams {
            drift: dec!(0.01),
            volatility: dec!(0.25),
            r_free: dec!(0.04),
            tau: dec!(0.15),
            alpha: dec!(0.4),
            q: None,
            eta: None,
            theta: None,
        }
    }

    #[test]
    fn test_reference_values() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        let c = m.claims(dec!(0.5), dec!(1), dec!(0.3)).unwrap();
        assert!(approx_eq(c.debt, dec!(9.812769), dec!(0.0001)), "debt = {}", c.debt);
        assert!(approx_eq(c.equity, dec!(18.480004), dec!(0.0001)), "equity = {}", c.equity);
        assert!(approx_eq(c.default_claim, dec!(0.363139), dec!(0.0001)));
    }

    #[test]
    fn test_firm_is_equity_plus_debt() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        for x in [dec!(0.3), dec!(0.7), dec!(1), dec!(2.5)] {
            let e = m.equity(dec!(0.5), x, dec!(0.3)).unwrap();
            let b = m.debt(dec!(0.5), x, dec!(0.3)).unwrap();
            let f = m.firm(dec!(0.5), x, dec!(0.3)).unwrap();
            assert_eq!(f, e + b);
        }
    }

    #[test]
    fn test_at_boundary_debt_gets_recovery() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        let debt = m.debt(dec!(0.5), dec!(0.3), dec!(0.3)).unwrap();
        let recovery = dec!(0.6) * d.value(dec!(0.3)).unwrap();
        assert!(approx_eq(debt, recovery, dec!(0.0000001)));
        let equity = m.equity(dec!(0.5), dec!(0.3), dec!(0.3)).unwrap();
        assert!(approx_eq(equity, Decimal::ZERO, dec!(0.0000001)));
    }

    #[test]
    fn test_frictionless_debt_approaches_risk_free() {
        let d = AssetDynamics::new(dec!(0.01), dec!(0.25), dec!(0.04), Decimal::ZERO, Decimal::ZERO)
            .unwrap();
        let m = LiquidationClaims::new(&d);
        let coupon = dec!(0.5);
        let risk_free = coupon / dec!(0.04);
        let debt = m.debt(coupon, dec!(1), dec!(0.000001)).unwrap();
        assert!(debt <= risk_free);
        assert!((risk_free - debt) / risk_free < dec!(0.0001), "debt = {debt}");
    }

    #[test]
    fn test_curve_matches_pointwise() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        let xs = [dec!(0.5), dec!(1), dec!(2)];
        let curve = m.curve(dec!(0.5), &xs, dec!(0.3)).unwrap();
        assert_eq!(curve.len(), 3);
        for (pt, x) in curve.iter().zip(xs) {
            assert_eq!(pt.cash_flow, x);
            assert_eq!(pt.debt, m.debt(dec!(0.5), x, dec!(0.3)).unwrap());
        }
    }

    #[test]
    fn test_max_coupon_pins_upper_bound() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        let opt = m.max_coupon(dec!(1), dec!(0.3)).unwrap();
        assert_eq!(opt.status, SearchStatus::UpperBound);
        assert_eq!(opt.coupon, m.coupon_bracket(dec!(1)).unwrap().upper);
    }

    #[test]
    fn test_huge_cash_flow_overflows_instead_of_panicking() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        let x = dec!(10000000000000000000000000000);
        let err = m.claims(dec!(1), x, dec!(1)).unwrap_err();
        assert!(matches!(err, CapStructError::ArithmeticOverflow { .. }), "{err}");
    }

    #[test]
    fn test_reject_cash_flow_below_boundary() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        assert!(m.debt(dec!(0.5), dec!(0.2), dec!(0.3)).is_err());
    }

    #[test]
    fn test_reject_negative_coupon() {
        let d = base_dynamics();
        let m = LiquidationClaims::new(&d);
        assert!(m.equity(dec!(-0.1), dec!(1), dec!(0.3)).is_err());
    }

    #[test]
    fn test_analysis_with_fixed_coupon() {
        let input = LiquidationInput {
            dynamics: base_params(),
            cash_flow: dec!(1),
            debt_liquidation: dec!(0.3),
            coupon: Some(dec!(0.5)),
            curve: Some(CurveSpec::default()),
        };
        let out = analyze_liquidation(&input).unwrap();
        let r = &out.result;
        assert!(r.search.is_none());
        assert_eq!(r.firm_value, r.equity + r.debt);
        assert!(r.credit_spread.unwrap() > Decimal::ZERO);
        assert_eq!(r.curve.len(), 50);
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[test]
    fn test_analysis_solves_coupon_and_warns() {
        let input = LiquidationInput {
            dynamics: base_params(),
            cash_flow: dec!(1),
            debt_liquidation: dec!(0.3),
            coupon: None,
            curve: None,
        };
        let out = analyze_liquidation(&input).unwrap();
        assert!(out.result.search.is_some());
        assert!(out.warnings.iter().any(|w| w.contains("UpperBound")));
    }

    #[test]
    fn test_analysis_omits_defaulted_curve_points() {
        let input = LiquidationInput {
            dynamics: base_params(),
            cash_flow: dec!(1),
            debt_liquidation: dec!(0.75),
            coupon: Some(dec!(0.5)),
            curve: Some(CurveSpec {
                from: dec!(0.5),
                to: dec!(1),
                points: 3,
            }),
        };
        let out = analyze_liquidation(&input).unwrap();
        assert_eq!(out.result.curve.len(), 2);
        assert!(out.warnings.iter().any(|w| w.contains("omitted")));
    }

    #[test]
    fn test_analysis_rejects_defaulted_firm() {
        let input = LiquidationInput {
            dynamics: base_params(),
            cash_flow: dec!(0.2),
            debt_liquidation: dec!(0.3),
            coupon: Some(dec!(0.5)),
            curve: None,
        };
        assert!(analyze_liquidation(&input).is_err());
    }
}
