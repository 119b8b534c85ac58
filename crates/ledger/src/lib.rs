//! # Portfolio Ledger
//!
//! Exact bookkeeping for one strategy's cash, positions, and equity history.
//!
//! ## Architectural Principles
//!
//! - **One ledger per strategy:** Portfolios are never shared. Every variant
//!   the orchestrator spawns gets its own `Portfolio`, so there is no
//!   aliasing between runs.
//! - **Single mutator:** Every position change, whether an order fill or an
//!   expiry settlement, routes through `Portfolio::adjust_holdings`. This is
//!   what keeps the holdings map consistent with cash.
//! - **Strict tick order:** `Portfolio::update_for_event` executes orders,
//!   refreshes marks, settles expirations, and records history in that exact
//!   order. Reordering any step corrupts the books.

pub mod portfolio;

pub use portfolio::{EquitySample, OpenPosition, Portfolio, PortfolioSnapshot};
