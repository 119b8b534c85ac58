//! # Strategy Library
//!
//! The trading policies of the backtester. This crate defines a universal
//! `Strategy` trait and provides the concrete option-strategy implementations.
//!
//! ## Architectural Principles
//!
//! - **Pure Policy:** A strategy reads a portfolio snapshot and an event and
//!   answers with orders. It never mutates the portfolio directly; every
//!   intended effect travels through the returned `Order` list.
//! - **Strategy Agnostic Engine:** By using the `Strategy` trait, the
//!   backtester drives any variant without knowing its internals.
//! - **Extensibility:** Adding a strategy means a new module implementing
//!   the trait plus one arm in the `factory` match.
//!
//! ## Public API
//!
//! The primary public components are:
//! - `Strategy`: the core trait all strategies implement.
//! - `create_strategy`: the factory mapping a type tag to an instance.
//! - The concrete strategy structs themselves (e.g. `CoveredCall`).

use ledger::PortfolioSnapshot;
use market_model::{Event, Order};

// Declare all the modules that constitute this crate.
pub mod buy_and_hold;
pub mod covered_call;
pub mod delta_neutral;
pub mod error;
pub mod factory;
pub mod leveraged_covered_call;
pub mod rnd_strategy;
pub mod wheel;

// Re-export the key components to create a clean, public-facing API.
pub use buy_and_hold::BuyAndHold;
pub use covered_call::CoveredCall;
pub use delta_neutral::DeltaNeutral;
pub use error::StrategyError;
pub use factory::create_strategy;
pub use leveraged_covered_call::LeveragedCoveredCall;
pub use rnd_strategy::RndStrategy;
pub use wheel::Wheel;

/// The core trait that all trading strategies must implement.
///
/// The `&mut self` in `handle_event` is crucial, as some strategies maintain
/// running state between ticks (e.g. the value a short leg was opened for).
/// The `Send + Sync` bounds allow variants to be driven from any task.
pub trait Strategy: Send + Sync {
    /// Decides this tick's orders.
    ///
    /// # Arguments
    ///
    /// * `portfolio` - A read-only snapshot of this strategy's own portfolio,
    ///   already reflecting the previous tick's settlement.
    /// * `event` - The day's market data.
    ///
    /// # Returns
    ///
    /// * `Ok(orders)` - the trades to execute against this event, possibly
    ///   empty.
    /// * `Err(StrategyError)` - if the decision could not be made; the
    ///   orchestrator skips the tick for this strategy and carries on.
    fn handle_event(
        &mut self,
        portfolio: &PortfolioSnapshot,
        event: &Event,
    ) -> Result<Vec<Order>, StrategyError>;

    /// Whether expiring in-the-money contracts settle into underlying shares
    /// (true) or close at their last marked price (false). Consulted only by
    /// the ledger's settlement step.
    fn take_assignment(&self) -> bool {
        false
    }

    /// Deterministic, parameter-encoding label used for ranking and for
    /// grouping permutation-expanded variants.
    fn unique_id(&self) -> String;
}
