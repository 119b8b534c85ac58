//! # Market Snapshot Model
//!
//! Immutable per-day option market data for a single underlying. This crate
//! defines the quote, chain, and event types that every other layer of the
//! backtester consumes.
//!
//! ## Architectural Principles
//!
//! - **Layer 0 Data:** This is a pure data crate. It has no knowledge of
//!   portfolios, strategies, or storage. Everything else depends on it.
//! - **Immutable Snapshots:** An `Event` describes one trading day. The data
//!   feed assembles it once; nothing downstream ever mutates it.
//! - **Explicit Ordering:** Every scan that a selection helper performs runs
//!   over a sorted view (expiries ascending, strikes ascending), so repeated
//!   runs over the same data produce identical picks.
//!
//! ## Public API
//!
//! The primary public components are:
//! - `OptionQuote` / `OptionType`: one contract's quote on one day.
//! - `OptionChain` / `OptionChainSet`: the per-expiry chains for a day.
//! - `Event`: a day's underlying price plus its full chain set, with the
//!   nearest-expiry / nearest-delta / nearest-credit selection helpers.
//! - `Order`: a signed quantity of a symbol to trade.
//! - `encode_symbol` / `parse_symbol`: the contract symbol codec.

// Declare all the modules that constitute this crate.
pub mod chain;
pub mod dates;
pub mod error;
pub mod event;
pub mod option;
pub mod order;
pub mod symbol;

// Re-export the key components to create a clean, public-facing API.
pub use chain::{OptionChain, OptionChainSet};
pub use dates::days_between;
pub use error::ModelError;
pub use event::Event;
pub use option::{OptionQuote, OptionType};
pub use order::Order;
pub use symbol::{SymbolParts, encode_symbol, parse_symbol};
