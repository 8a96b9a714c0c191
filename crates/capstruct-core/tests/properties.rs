use capstruct_core::{AssetDynamics, LiquidationClaims, RenegotiationClaims};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Integer basis points to a decimal rate.
fn bp(n: u32) -> Decimal {
    Decimal::new(n as i64, 4)
}

/// Hundredths to a decimal level.
fn cents(n: u32) -> Decimal {
    Decimal::new(n as i64, 2)
}

fn dynamics_strategy() -> impl Strategy<Value = AssetDynamics> {
    (
        0u32..300,    // drift, bp
        1000u32..6000, // volatility, bp
        350u32..900,  // r_free, bp
        0u32..4000,   // tau, bp
        0u32..10000,  // alpha, bp
        0u32..=10000, // q, bp
        0u32..=10000, // eta, bp
    )
        .prop_map(|(mu, sigma, r, tau, alpha, q, eta)| {
            AssetDynamics::with_optimal_theta(
                bp(mu),
                bp(sigma),
                bp(r),
                bp(tau),
                bp(alpha),
                bp(q),
                bp(eta),
            )
            .expect("strategy only generates admissible parameters")
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn renegotiation_firm_is_equity_plus_debt(
        d in dynamics_strategy(),
        coupon in 1u32..150,
        x in 50u32..400,
    ) {
        let m = RenegotiationClaims::new(&d).unwrap();
        let c = cents(coupon);
        let x = cents(x);
        prop_assume!(m.renegotiation_boundary(c).unwrap() <= x);

        let claims = m.claims(c, x).unwrap();
        prop_assert_eq!(claims.firm, claims.equity + claims.debt);
        prop_assert_eq!(m.firm(c, x).unwrap(), m.equity(c, x).unwrap() + m.debt(c, x).unwrap());
    }

    #[test]
    fn renegotiation_debt_bounded_by_risk_free(
        d in dynamics_strategy(),
        coupon in 1u32..150,
        x in 50u32..400,
    ) {
        let m = RenegotiationClaims::new(&d).unwrap();
        let c = cents(coupon);
        let x = cents(x);
        prop_assume!(m.renegotiation_boundary(c).unwrap() <= x);

        let debt = m.debt(c, x).unwrap();
        prop_assert!(debt <= c / d.r_free());
        prop_assert!(debt > Decimal::ZERO);
    }

    #[test]
    fn renegotiation_equity_increasing_in_cash_flow(
        d in dynamics_strategy(),
        coupon in 1u32..150,
        x in 50u32..400,
        step in 1u32..100,
    ) {
        let m = RenegotiationClaims::new(&d).unwrap();
        let c = cents(coupon);
        let lo = cents(x);
        let hi = cents(x + step);
        prop_assume!(m.renegotiation_boundary(c).unwrap() <= lo);

        prop_assert!(m.equity(c, hi).unwrap() > m.equity(c, lo).unwrap());
        prop_assert!(m.debt(c, hi).unwrap() >= m.debt(c, lo).unwrap());
    }

    #[test]
    fn liquidation_firm_is_equity_plus_debt(
        d in dynamics_strategy(),
        coupon in 0u32..150,
        boundary in 1u32..100,
        gap in 0u32..300,
    ) {
        let m = LiquidationClaims::new(&d);
        let c = cents(coupon);
        let xb = cents(boundary);
        let x = cents(boundary + gap);

        let claims = m.claims(c, x, xb).unwrap();
        prop_assert_eq!(claims.firm, claims.equity + claims.debt);
    }

    #[test]
    fn default_claim_decays_with_cash_flow(
        d in dynamics_strategy(),
        boundary in 1u32..100,
        gap in 1u32..300,
    ) {
        let k = d.kernel();
        let xb = cents(boundary);
        let near = k.default_claim_value(xb + cents(gap), xb).unwrap();
        let far = k.default_claim_value(xb + cents(2 * gap), xb).unwrap();
        prop_assert!(near < Decimal::ONE);
        prop_assert!(far < near);
        prop_assert!(far > Decimal::ZERO);
    }
}
