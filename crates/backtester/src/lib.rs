//! # Backtester
//!
//! The orchestrator. It expands a run description into concrete strategy
//! variants, pairs each with its own portfolio, replays the event stream
//! through every pair in a fixed order, and ranks the outcomes.
//!
//! ## Architectural Principles
//!
//! - **One Portfolio Per Variant:** Portfolios are never shared. A
//!   strategy's decision for a tick cannot observe another strategy's state.
//! - **Strict Chronology:** The stream is consumed once, oldest event first.
//!   Within a tick every pair is processed to completion before the next
//!   event is pulled; settlement and drawdown only make sense in order.
//! - **Isolated Failures:** A strategy that errors on a tick trades nothing
//!   that tick. Only feed errors abort a run.
//!
//! ## Public API
//!
//! - `spawn_strategies`: run description to `StrategyPair` list.
//! - `Backtester`: owns the pairs and drives the replay loop.
//! - `StrategySummary`: one ranked result row per pair.

use crate::permute::expand_parameters;
use configuration::Settings;
use datafeed::EventSource;
use ledger::Portfolio;
use rust_decimal::Decimal;
use serde_json::Value;
use strategies::{Strategy, create_strategy};

pub mod error;
pub mod permute;

pub use error::BacktesterError;

/// Keys of the run description consumed by the orchestrator itself. They
/// never reach a strategy and never act as permutation axes.
const RESERVED_KEYS: [&str; 2] = ["strategies", "analyze"];

/// One strategy variant bound to the portfolio it trades.
pub struct StrategyPair {
    pub strategy: Box<dyn Strategy>,
    pub portfolio: Portfolio,
    /// The fully expanded parameter document this variant was built from.
    pub parameters: Value,
}

/// Final result row for one pair.
#[derive(Debug, Clone)]
pub struct StrategySummary {
    pub performance_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    pub net_value: Decimal,
    pub unique_id: String,
    pub parameters: Value,
}

/// Builds one `StrategyPair` per concrete parameter set in the run
/// description.
///
/// A single `strategy` key makes the whole document the parameter space;
/// a `strategies` list expands each entry independently. Either way every
/// list-valued key multiplies out into variants. An unknown or missing
/// strategy name is fatal before the run starts.
pub fn spawn_strategies(settings: &Settings) -> Result<Vec<StrategyPair>, BacktesterError> {
    let document = &settings.document;
    let mut pairs = Vec::new();

    if document.get("strategy").is_some() {
        let mut base = document.clone();
        if let Some(map) = base.as_object_mut() {
            for key in RESERVED_KEYS {
                map.remove(key);
            }
        }
        for variant in expand_parameters(&base) {
            pairs.push(build_pair(settings, variant)?);
        }
    } else if let Some(specs) = document.get("strategies").and_then(Value::as_array) {
        for spec in specs {
            for variant in expand_parameters(spec) {
                pairs.push(build_pair(settings, variant)?);
            }
        }
    }
    Ok(pairs)
}

fn build_pair(settings: &Settings, variant: Value) -> Result<StrategyPair, BacktesterError> {
    let name = match variant.get("strategy").and_then(Value::as_str) {
        Some(name) => name,
        None => return Err(BacktesterError::MissingStrategyName(variant.to_string())),
    };
    let strategy = create_strategy(name, &variant)?;
    Ok(StrategyPair {
        strategy,
        portfolio: Portfolio::new(settings.startcash),
        parameters: variant,
    })
}

/// Drives the replay loop over a set of strategy pairs.
pub struct Backtester {
    pairs: Vec<StrategyPair>,
}

impl Backtester {
    pub fn new(pairs: Vec<StrategyPair>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[StrategyPair] {
        &self.pairs
    }

    /// Replays the source to exhaustion and returns the ranked summaries.
    ///
    /// Ranking is descending on (performance, max drawdown, net value,
    /// unique id), so the best performer comes first and ties fall back to
    /// the smaller drawdown.
    pub async fn run<S: EventSource>(
        &mut self,
        source: &mut S,
    ) -> Result<Vec<StrategySummary>, BacktesterError> {
        if self.pairs.is_empty() {
            tracing::info!("No strategies specified; nothing to test.");
        } else {
            let ids: Vec<String> = self
                .pairs
                .iter()
                .map(|pair| pair.strategy.unique_id())
                .collect();
            tracing::info!("Testing strategies: {}", ids.join(","));
        }

        while let Some(event) = source.next_event().await? {
            tracing::info!(
                "New event for {}, date {}, price {}",
                event.ticker(),
                event.quote_date(),
                event.underlying_price()
            );

            for pair in &mut self.pairs {
                let snapshot = pair.portfolio.snapshot();
                let orders = match pair.strategy.handle_event(&snapshot, &event) {
                    Ok(orders) => orders,
                    Err(error) => {
                        tracing::warn!(
                            "Strategy {} skipped the tick: {}",
                            pair.strategy.unique_id(),
                            error
                        );
                        Vec::new()
                    }
                };
                if !orders.is_empty() {
                    let placed: Vec<String> =
                        orders.iter().map(|order| order.to_string()).collect();
                    tracing::info!(
                        "{} placed orders: {}",
                        pair.strategy.unique_id(),
                        placed.join(", ")
                    );
                }
                pair.portfolio
                    .update_for_event(&orders, &event, pair.strategy.take_assignment());
                tracing::info!(
                    "Strategy {} Portfolio Value {:.2} Performance {:.2}% MaxDrawdown {:.2}%",
                    pair.strategy.unique_id(),
                    pair.portfolio.net_value(),
                    pair.portfolio.performance(),
                    pair.portfolio.max_drawdown()
                );
            }
        }

        tracing::info!("Out of events! Final results");
        let mut summaries: Vec<StrategySummary> = self
            .pairs
            .iter()
            .map(|pair| StrategySummary {
                performance_pct: pair.portfolio.performance(),
                max_drawdown_pct: pair.portfolio.max_drawdown(),
                net_value: pair.portfolio.net_value(),
                unique_id: pair.strategy.unique_id(),
                parameters: pair.parameters.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| {
            (
                b.performance_pct,
                b.max_drawdown_pct,
                b.net_value,
                &b.unique_id,
            )
                .cmp(&(
                    a.performance_pct,
                    a.max_drawdown_pct,
                    a.net_value,
                    &a.unique_id,
                ))
        });
        for summary in &summaries {
            tracing::info!(
                "Strategy {} Portfolio Value {:.2} Performance {:.2}% MaxDrawdown {:.2}%",
                summary.unique_id,
                summary.net_value,
                summary.performance_pct,
                summary.max_drawdown_pct
            );
        }
        Ok(summaries)
    }
}
