pub mod asset_dynamics;
pub mod barrier;
pub mod claims;
pub mod coupon_search;
pub mod error;
pub mod types;

pub use asset_dynamics::{AssetDynamics, AssetDynamicsParams};
pub use barrier::BarrierKernel;
pub use error::CapStructError;
pub use types::*;

#[cfg(feature = "liquidation")]
pub use claims::liquidation::LiquidationClaims;

#[cfg(feature = "renegotiation")]
pub use claims::renegotiation::RenegotiationClaims;

/// Standard result type for all capstruct operations
pub type CapStructResult<T> = Result<T, CapStructError>;
