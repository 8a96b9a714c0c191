use clap::Args;
use rust_decimal::Decimal;

use capstruct_core::claims::CurveSpec;
use capstruct_core::AssetDynamicsParams;

/// Asset-process and friction flags shared by every model
#[derive(Args)]
pub struct DynamicsArgs {
    /// Drift of the cash-flow process (decimal)
    #[arg(long)]
    pub drift: Option<Decimal>,

    /// Volatility of the cash-flow process (decimal)
    #[arg(long, alias = "vol")]
    pub volatility: Option<Decimal>,

    /// Riskless rate (decimal)
    #[arg(long, alias = "rf")]
    pub r_free: Option<Decimal>,

    /// Corporate tax rate
    #[arg(long)]
    pub tau: Option<Decimal>,

    /// Fraction of asset value lost in liquidation
    #[arg(long)]
    pub alpha: Option<Decimal>,
}

impl DynamicsArgs {
    pub fn to_params(
        &self,
        q: Option<Decimal>,
        eta: Option<Decimal>,
        theta: Option<Decimal>,
    ) -> Result<AssetDynamicsParams, Box<dyn std::error::Error>> {
        Ok(AssetDynamicsParams {
            drift: self.drift.ok_or("--drift is required (or provide --input)")?,
            volatility: self
                .volatility
                .ok_or("--volatility is required (or provide --input)")?,
            r_free: self.r_free.ok_or("--r-free is required (or provide --input)")?,
            tau: self.tau.ok_or("--tau is required (or provide --input)")?,
            alpha: self.alpha.ok_or("--alpha is required (or provide --input)")?,
            q,
            eta,
            theta,
        })
    }
}

/// Claims-curve flags
#[derive(Args)]
pub struct CurveArgs {
    /// Emit equity/debt/firm values over a cash-flow grid
    #[arg(long)]
    pub curve: bool,

    /// First cash-flow level of the curve
    #[arg(long, requires = "curve")]
    pub curve_from: Option<Decimal>,

    /// Last cash-flow level of the curve
    #[arg(long, requires = "curve")]
    pub curve_to: Option<Decimal>,

    /// Number of curve points
    #[arg(long, requires = "curve")]
    pub curve_points: Option<u32>,
}

impl CurveArgs {
    pub fn to_spec(&self) -> Option<CurveSpec> {
        if !self.curve {
            return None;
        }
        let default = CurveSpec::default();
        Some(CurveSpec {
            from: self.curve_from.unwrap_or(default.from),
            to: self.curve_to.unwrap_or(default.to),
            points: self.curve_points.unwrap_or(default.points),
        })
    }
}
