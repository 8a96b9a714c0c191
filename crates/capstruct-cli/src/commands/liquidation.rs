use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use capstruct_core::claims::liquidation::{self, LiquidationInput};

use super::dynamics::{CurveArgs, DynamicsArgs};
use crate::input;

/// Arguments for the immediate-liquidation model
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LiquidationArgs {
    /// Path to JSON scenario file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub dynamics: DynamicsArgs,

    /// Current cash-flow level
    #[arg(long)]
    pub cash_flow: Option<Decimal>,

    /// Cash-flow level at which the firm is liquidated
    #[arg(long, alias = "boundary")]
    pub debt_liquidation: Option<Decimal>,

    /// Coupon to value; the bracket-maximizing coupon is reported when omitted
    #[arg(long)]
    pub coupon: Option<Decimal>,

    #[command(flatten)]
    pub curve: CurveArgs,
}

pub fn run_liquidation(args: LiquidationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let liq_input: LiquidationInput = match input::read_scenario(args.input.as_deref())? {
        Some(scenario) => scenario,
        None => LiquidationInput {
            dynamics: args.dynamics.to_params(None, None, None)?,
            cash_flow: args
                .cash_flow
                .ok_or("--cash-flow is required (or provide --input)")?,
            debt_liquidation: args
                .debt_liquidation
                .ok_or("--debt-liquidation is required (or provide --input)")?,
            coupon: args.coupon,
            curve: args.curve.to_spec(),
        },
    };

    let result = liquidation::analyze_liquidation(&liq_input)?;
    Ok(serde_json::to_value(result)?)
}
