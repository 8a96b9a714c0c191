//! Unlevered-asset process and the frictions shared by every claim model.
//!
//! The firm's operating cash flow `x` follows a geometric process with drift μ
//! and volatility σ. Its after-tax perpetuity value discounted at the riskless
//! rate r is
//!
//! ```text
//! V(x) = x · (1 − τ) / (r − μ)
//! ```
//!
//! The renegotiation terms (q, η, θ) are optional: the liquidation model never
//! reads them, and the renegotiation model checks for them when it is built.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::barrier::BarrierKernel;
use crate::error::CapStructError;
use crate::types::{checked_div, checked_mul, checked_sub, Money, Rate};
use crate::CapStructResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw, unvalidated parameters as they arrive from JSON or CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDynamicsParams {
    /// Expected growth of dX/X.
    pub drift: Rate,
    /// Volatility of dX/X.
    pub volatility: Rate,
    /// Riskless discount rate.
    pub r_free: Rate,
    /// Corporate tax rate.
    pub tau: Rate,
    /// Fraction of asset value lost in liquidation.
    pub alpha: Rate,
    /// Probability that hitting the trigger ends in liquidation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<Rate>,
    /// Shareholders' bargaining power in renegotiation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<Rate>,
    /// Shareholders' share of asset value after a successful renegotiation.
    /// Derived as `eta * alpha` when absent and `eta` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta: Option<Rate>,
}

/// Validated, immutable asset-process parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssetDynamicsParams")]
pub struct AssetDynamics {
    drift: Rate,
    volatility: Rate,
    r_free: Rate,
    tau: Rate,
    alpha: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eta: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    theta: Option<Rate>,
    #[serde(skip)]
    kernel: BarrierKernel,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl AssetDynamics {
    /// Parameters for the liquidation model (no renegotiation terms).
    pub fn new(
        drift: Rate,
        volatility: Rate,
        r_free: Rate,
        tau: Rate,
        alpha: Rate,
    ) -> CapStructResult<Self> {
        Self::with_renegotiation(drift, volatility, r_free, tau, alpha, None, None, None)
    }

    /// Full parameter set, any of the renegotiation terms may be absent.
    #[allow(clippy::too_many_arguments)]
    pub fn with_renegotiation(
        drift: Rate,
        volatility: Rate,
        r_free: Rate,
        tau: Rate,
        alpha: Rate,
        q: Option<Rate>,
        eta: Option<Rate>,
        theta: Option<Rate>,
    ) -> CapStructResult<Self> {
        let params = AssetDynamicsParams {
            drift,
            volatility,
            r_free,
            tau,
            alpha,
            q,
            eta,
            theta,
        };
        validate_params(&params)?;
        let kernel = BarrierKernel::new(drift, volatility, r_free)?;

        Ok(Self {
            drift,
            volatility,
            r_free,
            tau,
            alpha,
            q,
            eta,
            theta,
            kernel,
        })
    }

    /// Renegotiation parameters with the shareholders' share set to their
    /// bargaining power times the liquidation loss: `theta = eta * alpha`.
    pub fn with_optimal_theta(
        drift: Rate,
        volatility: Rate,
        r_free: Rate,
        tau: Rate,
        alpha: Rate,
        q: Rate,
        eta: Rate,
    ) -> CapStructResult<Self> {
        Self::with_renegotiation(
            drift,
            volatility,
            r_free,
            tau,
            alpha,
            Some(q),
            Some(eta),
            Some(checked_mul(eta, alpha, "theta from eta")?),
        )
    }
}

impl TryFrom<AssetDynamicsParams> for AssetDynamics {
    type Error = CapStructError;

    fn try_from(p: AssetDynamicsParams) -> Result<Self, Self::Error> {
        let theta = match (p.theta, p.eta) {
            (Some(theta), _) => Some(theta),
            (None, Some(eta)) => Some(checked_mul(eta, p.alpha, "theta from eta")?),
            (None, None) => None,
        };
        Self::with_renegotiation(
            p.drift,
            p.volatility,
            p.r_free,
            p.tau,
            p.alpha,
            p.q,
            p.eta,
            theta,
        )
    }
}

// ---------------------------------------------------------------------------
// Accessors and valuation
// ---------------------------------------------------------------------------

impl AssetDynamics {
    pub fn drift(&self) -> Rate {
        self.drift
    }

    pub fn volatility(&self) -> Rate {
        self.volatility
    }

    pub fn r_free(&self) -> Rate {
        self.r_free
    }

    pub fn tau(&self) -> Rate {
        self.tau
    }

    pub fn alpha(&self) -> Rate {
        self.alpha
    }

    pub fn q(&self) -> Option<Rate> {
        self.q
    }

    pub fn eta(&self) -> Option<Rate> {
        self.eta
    }

    pub fn theta(&self) -> Option<Rate> {
        self.theta
    }

    pub fn kernel(&self) -> &BarrierKernel {
        &self.kernel
    }

    pub fn beta2(&self) -> Decimal {
        self.kernel.beta2()
    }

    /// After-tax perpetuity value of a cash-flow level growing at μ and
    /// discounted at r.
    pub fn value(&self, cash_flow: Money) -> CapStructResult<Money> {
        let ctx = "perpetuity value";
        let after_tax = checked_mul(cash_flow, Decimal::ONE - self.tau, ctx)?;
        checked_div(after_tax, checked_sub(self.r_free, self.drift, ctx)?, ctx)
    }

    /// Element-wise [`value`](Self::value).
    pub fn values(&self, cash_flows: &[Money]) -> CapStructResult<Vec<Money>> {
        cash_flows.iter().map(|x| self.value(*x)).collect()
    }

    /// Value of the riskless perpetual coupon stream, `coupon / r`.
    pub fn risk_free_debt(&self, coupon: Money) -> CapStructResult<Money> {
        checked_div(coupon, self.r_free, "risk-free debt")
    }

    /// `(q, theta)`, required by the renegotiation model only.
    pub fn renegotiation_terms(&self) -> CapStructResult<(Rate, Rate)> {
        let q = self.q.ok_or_else(|| CapStructError::InvalidInput {
            field: "q".into(),
            reason: "Liquidation probability under renegotiation is required.".into(),
        })?;
        let theta = self.theta.ok_or_else(|| CapStructError::InvalidInput {
            field: "theta".into(),
            reason: "Shareholders' renegotiated share (or eta to derive it) is required.".into(),
        })?;
        Ok((q, theta))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_params(p: &AssetDynamicsParams) -> CapStructResult<()> {
    if p.volatility <= Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "volatility".into(),
            reason: "Volatility must be positive.".into(),
        });
    }
    if p.r_free <= Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "r_free".into(),
            reason: "Risk-free rate must be positive.".into(),
        });
    }
    if p.r_free <= p.drift {
        return Err(CapStructError::InvalidInput {
            field: "drift".into(),
            reason: format!(
                "Drift {} must be below the risk-free rate {} for a finite firm value.",
                p.drift, p.r_free
            ),
        });
    }
    if p.tau < Decimal::ZERO || p.tau >= Decimal::ONE {
        return Err(CapStructError::InvalidInput {
            field: "tau".into(),
            reason: "Tax rate must lie in [0, 1).".into(),
        });
    }
    validate_unit_interval("alpha", p.alpha)?;
    if let Some(q) = p.q {
        validate_unit_interval("q", q)?;
    }
    if let Some(eta) = p.eta {
        validate_unit_interval("eta", eta)?;
    }
    if let Some(theta) = p.theta {
        validate_unit_interval("theta", theta)?;
    }
    Ok(())
}

fn validate_unit_interval(field: &str, value: Rate) -> CapStructResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(CapStructError::InvalidInput {
            field: field.into(),
            reason: format!("Must lie in [0, 1], got {value}."),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn base_dynamics() -> AssetDynamics {
        AssetDynamics::with_optimal_theta(
            dec!(0.01),
            dec!(0.25),
            dec!(0.04),
            dec!(0.15),
            dec!(0.4),
            dec!(1),
            dec!(0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_perpetuity_value() {
        let d = base_dynamics();
        // 1 * 0.85 / 0.03
        let v = d.value(dec!(3)).unwrap();
        assert_eq!(v, dec!(85));
    }

    #[test]
    fn test_values_broadcast() {
        let d = base_dynamics();
        let vs = d.values(&[dec!(0.3), dec!(0.6), dec!(3)]).unwrap();
        assert_eq!(vs, vec![dec!(8.5), dec!(17), dec!(85)]);
    }

    #[test]
    fn test_optimal_theta_is_eta_times_alpha() {
        let d = base_dynamics();
        assert_eq!(d.theta(), Some(dec!(0.2)));
        assert_eq!(d.renegotiation_terms().unwrap(), (dec!(1), dec!(0.2)));
    }

    #[test]
    fn test_liquidation_parameters_lack_renegotiation_terms() {
        let d = AssetDynamics::new(dec!(0.01), dec!(0.25), dec!(0.04), dec!(0.15), dec!(0.4))
            .unwrap();
        assert!(d.q().is_none());
        assert!(d.renegotiation_terms().is_err());
    }

    #[test]
    fn test_kernel_matches_parameters() {
        let d = base_dynamics();
        let direct = crate::barrier::beta2(dec!(0.01), dec!(0.25), dec!(0.04)).unwrap();
        assert_eq!(d.beta2(), direct);
    }

    #[test]
    fn test_reject_rate_equal_to_drift() {
        let r = AssetDynamics::new(dec!(0.04), dec!(0.25), dec!(0.04), dec!(0.15), dec!(0.4));
        assert!(r.is_err());
    }

    #[test]
    fn test_reject_zero_volatility() {
        let r = AssetDynamics::new(dec!(0.01), Decimal::ZERO, dec!(0.04), dec!(0.15), dec!(0.4));
        assert!(r.is_err());
    }

    #[test]
    fn test_tiny_volatility_is_an_error_not_a_panic() {
        let err = AssetDynamics::new(
            dec!(0.01),
            dec!(0.000000001),
            dec!(0.04),
            dec!(0.15),
            dec!(0.4),
        )
        .unwrap_err();
        assert!(matches!(err, CapStructError::ArithmeticOverflow { .. }), "{err}");
    }

    #[test]
    fn test_huge_cash_flow_value_overflows() {
        let d = base_dynamics();
        let err = d.value(Decimal::MAX).unwrap_err();
        assert!(matches!(err, CapStructError::ArithmeticOverflow { .. }), "{err}");
        assert!(d.values(&[dec!(1), Decimal::MAX]).is_err());
    }

    #[test]
    fn test_out_of_range_eta_rejected_without_panic() {
        let params = AssetDynamicsParams {
            drift: dec!(0.01),
            volatility: dec!(0.25),
            r_free: dec!(0.04),
            tau: dec!(0.15),
            alpha: dec!(0.4),
            q: Some(dec!(1)),
            eta: Some(Decimal::MAX),
            theta: None,
        };
        assert!(AssetDynamics::try_from(params).is_err());
    }

    #[test]
    fn test_reject_full_tax() {
        let r = AssetDynamics::new(dec!(0.01), dec!(0.25), dec!(0.04), Decimal::ONE, dec!(0.4));
        assert!(r.is_err());
    }

    #[test]
    fn test_reject_out_of_range_q() {
        let r = AssetDynamics::with_optimal_theta(
            dec!(0.01),
            dec!(0.25),
            dec!(0.04),
            dec!(0.15),
            dec!(0.4),
            dec!(1.2),
            dec!(0.5),
        );
        assert!(r.is_err());
    }

    #[test]
    fn test_deserialize_derives_theta_from_eta() {
        let json = r#"{
            "drift": "0.01", "volatility": "0.25", "r_free": "0.04",
            "tau": "0.15", "alpha": "0.4", "q": "1", "eta": "0.5"
        }"#;
        let d: AssetDynamics = serde_json::from_str(json).unwrap();
        assert_eq!(d, base_dynamics());
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        let json = r#"{
            "drift": "0.05", "volatility": "0.25", "r_free": "0.04",
            "tau": "0.15", "alpha": "0.4"
        }"#;
        assert!(serde_json::from_str::<AssetDynamics>(json).is_err());
    }
}
