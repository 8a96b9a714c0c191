pub mod dynamics;
pub mod liquidation;
pub mod renegotiation;
