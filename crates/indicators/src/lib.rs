//! # Indicators
//!
//! Numerical analytics layered on top of the market snapshot model. The one
//! resident today is the option-implied risk-neutral distribution, consumed
//! by strategies that rank contracts by expected profit.
//!
//! The engine itself never depends on this crate; a strategy that cannot fit
//! a distribution simply trades nothing that tick.

pub mod error;
pub mod rnd;

pub use error::IndicatorError;
pub use rnd::RndDistribution;
