use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use capstruct_core::claims::renegotiation::{self, RenegotiationInput};

use super::dynamics::{CurveArgs, DynamicsArgs};
use crate::input;

/// Arguments for the strategic-renegotiation model
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RenegotiationArgs {
    /// Path to JSON scenario file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub dynamics: DynamicsArgs,

    /// Probability that hitting the trigger ends in liquidation
    #[arg(long)]
    pub q: Option<Decimal>,

    /// Shareholders' bargaining power; theta defaults to eta * alpha
    #[arg(long)]
    pub eta: Option<Decimal>,

    /// Shareholders' share of asset value after renegotiation
    #[arg(long)]
    pub theta: Option<Decimal>,

    /// Current cash-flow level
    #[arg(long)]
    pub cash_flow: Option<Decimal>,

    /// Coupon to value; the value-maximizing coupon is solved for when omitted
    #[arg(long)]
    pub coupon: Option<Decimal>,

    #[command(flatten)]
    pub curve: CurveArgs,
}

pub fn run_renegotiation(args: RenegotiationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let reneg_input: RenegotiationInput = match input::read_scenario(args.input.as_deref())? {
        Some(scenario) => scenario,
        None => {
            if args.eta.is_none() && args.theta.is_none() {
                return Err("--eta or --theta is required (or provide --input)".into());
            }
            RenegotiationInput {
                dynamics: args.dynamics.to_params(
                    Some(args.q.ok_or("--q is required (or provide --input)")?),
                    args.eta,
                    args.theta,
                )?,
                cash_flow: args
                    .cash_flow
                    .ok_or("--cash-flow is required (or provide --input)")?,
                coupon: args.coupon,
                curve: args.curve.to_spec(),
            }
        }
    };

    let result = renegotiation::analyze_renegotiation(&reneg_input)?;
    Ok(serde_json::to_value(result)?)
}
