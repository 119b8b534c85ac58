//! # Data Feed
//!
//! Turns the option quote archive into the chronological stream of daily
//! [`Event`](market_model::Event)s the backtester replays. This crate is the
//! only place that knows about the database; everything downstream consumes
//! the `EventSource` trait.
//!
//! ## Architectural Principles
//!
//! - **One Trait In Front:** The engine is written against `EventSource`.
//!   The MySQL-backed feed and the in-memory feed used by tests are
//!   interchangeable.
//! - **Load Once, Replay Many:** A feed materializes its events up front and
//!   hands them out one per call. Replay order is the archive's quote date
//!   order, oldest first.
//!
//! ## Public API
//!
//! - `EventSource`: the async trait the backtester drains.
//! - `DbEventFeed`: events grouped out of the MySQL quote archive.
//! - `MemoryEventFeed`: a canned feed for tests and experiments.
//! - `connect`: establishes the MySQL connection pool.
//! - `FeedError`: the specific error types this crate can return.

pub mod db;
pub mod error;
pub mod source;

pub use db::{DbEventFeed, connect};
pub use error::FeedError;
pub use source::{EventSource, MemoryEventFeed};
