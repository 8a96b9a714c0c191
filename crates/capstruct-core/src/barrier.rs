//! Perpetual barrier-hitting ("Arrow-Debreu") claim shared by both claim
//! models.
//!
//! Under a geometric cash-flow process with drift μ and volatility σ, a claim
//! paying one unit the first time the process falls to a lower barrier `b`
//! is worth `(x / b) ^ β2` today, where `x ≥ b` is the current level and β2 is
//! the negative root of
//!
//! ```text
//! 0.5·σ²·β² + (μ − 0.5·σ²)·β − r = 0
//! ```
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CapStructError;
use crate::types::{checked_add, checked_div, checked_mul, checked_sub, Money, Rate};
use crate::CapStructResult;

// ---------------------------------------------------------------------------
// Exponent
// ---------------------------------------------------------------------------

/// Negative root of the fundamental quadratic:
/// `0.5 − μ/σ² − sqrt((0.5 − μ/σ²)² + 2r/σ²)`.
///
/// Strictly negative whenever `r_free > 0`.
pub fn beta2(drift: Rate, volatility: Rate, r_free: Rate) -> CapStructResult<Decimal> {
    if volatility <= Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "volatility".into(),
            reason: "Volatility must be positive.".into(),
        });
    }
    if r_free < Decimal::ZERO {
        return Err(CapStructError::InvalidInput {
            field: "r_free".into(),
            reason: "Risk-free rate must be non-negative for a real exponent.".into(),
        });
    }

    let ctx = "beta2";
    let sigma2 = checked_mul(volatility, volatility, ctx)?;
    let a = checked_sub(dec!(0.5), checked_div(drift, sigma2, ctx)?, ctx)?;
    let discriminant = checked_add(
        checked_mul(a, a, ctx)?,
        checked_div(checked_mul(dec!(2), r_free, ctx)?, sigma2, ctx)?,
        ctx,
    )?;
    let root = discriminant
        .sqrt()
        .ok_or_else(|| CapStructError::ArithmeticOverflow {
            context: "beta2 discriminant square root".into(),
        })?;

    checked_sub(a, root, ctx)
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// Hitting-claim pricer for one set of asset-process parameters.
///
/// Computed once per engine so both claim models read the same exponent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierKernel {
    beta2: Decimal,
}

impl BarrierKernel {
    pub fn new(drift: Rate, volatility: Rate, r_free: Rate) -> CapStructResult<Self> {
        Ok(Self {
            beta2: beta2(drift, volatility, r_free)?,
        })
    }

    pub fn beta2(&self) -> Decimal {
        self.beta2
    }

    /// Price today of one unit paid the first time cash flow falls to
    /// `barrier`, given it currently stands at `cash_flow`.
    ///
    /// Exactly 1 at `cash_flow == barrier`. A level below the barrier is an
    /// already-defaulted state and is rejected.
    pub fn default_claim_value(&self, cash_flow: Money, barrier: Money) -> CapStructResult<Decimal> {
        if barrier <= Decimal::ZERO {
            return Err(CapStructError::InvalidInput {
                field: "barrier".into(),
                reason: "Default barrier must be positive.".into(),
            });
        }
        if cash_flow < barrier {
            return Err(CapStructError::FinancialImpossibility(format!(
                "Cash flow {cash_flow} is below the default barrier {barrier}; the firm has already defaulted."
            )));
        }
        if cash_flow == barrier {
            return Ok(Decimal::ONE);
        }

        let ratio = checked_div(cash_flow, barrier, "default claim ratio")?;
        ratio
            .checked_powd(self.beta2)
            .ok_or_else(|| CapStructError::ArithmeticOverflow {
                context: format!("default claim ({ratio})^{}", self.beta2),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn base_kernel() -> BarrierKernel {
        BarrierKernel::new(dec!(0.01), dec!(0.25), dec!(0.04)).unwrap()
    }

    #[test]
    fn test_beta2_reference_value() {
        // 0.34 - sqrt(0.34^2 + 1.28) = 0.34 - 1.181355
        let b = beta2(dec!(0.01), dec!(0.25), dec!(0.04)).unwrap();
        assert!(approx_eq(b, dec!(-0.841355), dec!(0.00001)), "beta2 = {b}");
    }

    #[test]
    fn test_beta2_solves_quadratic() {
        let (mu, sigma, r) = (dec!(0.02), dec!(0.3), dec!(0.05));
        let b = beta2(mu, sigma, r).unwrap();
        let residual = dec!(0.5) * sigma * sigma * b * b + (mu - dec!(0.5) * sigma * sigma) * b - r;
        assert!(approx_eq(residual, Decimal::ZERO, dec!(0.0000001)));
    }

    #[test]
    fn test_beta2_negative_on_grid() {
        let drifts = [dec!(-0.05), dec!(0), dec!(0.01), dec!(0.03)];
        let vols = [dec!(0.05), dec!(0.2), dec!(0.5), dec!(1.0)];
        let rates = [dec!(0.005), dec!(0.04), dec!(0.10)];
        for mu in drifts {
            for sigma in vols {
                for r in rates {
                    let b = beta2(mu, sigma, r).unwrap();
                    assert!(b < Decimal::ZERO, "beta2({mu}, {sigma}, {r}) = {b}");
                }
            }
        }
    }

    #[test]
    fn test_claim_is_one_at_barrier() {
        let k = base_kernel();
        assert_eq!(k.default_claim_value(dec!(0.35), dec!(0.35)).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_claim_strictly_decreasing() {
        let k = base_kernel();
        let barrier = dec!(0.5);
        let levels = [dec!(0.5), dec!(0.75), dec!(1), dec!(2), dec!(4), dec!(16)];
        let values: Vec<Decimal> = levels
            .iter()
            .map(|x| k.default_claim_value(*x, barrier).unwrap())
            .collect();
        for w in values.windows(2) {
            assert!(w[1] < w[0], "{} should be < {}", w[1], w[0]);
        }
    }

    #[test]
    fn test_claim_vanishes_far_from_barrier() {
        let k = base_kernel();
        let v = k.default_claim_value(dec!(1000000), dec!(1)).unwrap();
        assert!(v < dec!(0.0001), "claim = {v}");
        assert!(v > Decimal::ZERO);
    }

    #[test]
    fn test_reject_zero_volatility() {
        assert!(beta2(dec!(0.01), Decimal::ZERO, dec!(0.04)).is_err());
    }

    #[test]
    fn test_reject_negative_rate() {
        assert!(beta2(dec!(0.01), dec!(0.2), dec!(-0.01)).is_err());
    }

    #[test]
    fn test_tiny_volatility_overflows_instead_of_panicking() {
        let err = beta2(dec!(0.01), dec!(0.000000001), dec!(0.04)).unwrap_err();
        assert!(matches!(err, CapStructError::ArithmeticOverflow { .. }), "{err}");
    }

    #[test]
    fn test_vanishing_volatility_squared_is_an_error() {
        // 1e-15 squared rounds to zero at 28 decimal places
        assert!(beta2(dec!(0.01), dec!(0.000000000000001), dec!(0.04)).is_err());
    }

    #[test]
    fn test_reject_non_positive_barrier() {
        let k = base_kernel();
        assert!(k.default_claim_value(dec!(1), Decimal::ZERO).is_err());
        assert!(k.default_claim_value(dec!(1), dec!(-0.5)).is_err());
    }

    #[test]
    fn test_reject_cash_flow_below_barrier() {
        let k = base_kernel();
        let err = k.default_claim_value(dec!(0.2), dec!(0.3)).unwrap_err();
        assert!(matches!(err, CapStructError::FinancialImpossibility(_)));
    }
}
