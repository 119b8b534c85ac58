use crate::Strategy;
use crate::error::StrategyError;
use indicators::RndDistribution;
use ledger::PortfolioSnapshot;
use market_model::{Event, OptionQuote, Order};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

fn default_dte() -> i64 {
    5
}

fn default_possize() -> Decimal {
    Decimal::TEN
}

fn default_mincalldelta() -> f64 {
    0.3
}

fn default_maxcalldelta() -> f64 {
    0.7
}

fn default_minputdelta() -> f64 {
    -0.7
}

fn default_maxputdelta() -> f64 {
    -0.3
}

#[derive(Debug, Clone, Deserialize)]
pub struct RndStrategyParams {
    /// Preferred days to expiry for the traded chain.
    #[serde(default = "default_dte")]
    pub dte: i64,
    /// Contracts per position, long or short.
    #[serde(default = "default_possize")]
    pub possize: Decimal,
    #[serde(default = "default_mincalldelta")]
    pub mincalldelta: f64,
    #[serde(default = "default_maxcalldelta")]
    pub maxcalldelta: f64,
    #[serde(default = "default_minputdelta")]
    pub minputdelta: f64,
    #[serde(default = "default_maxputdelta")]
    pub maxputdelta: f64,
}

/// Trades the gap between quoted premiums and the risk neutral density
/// implied by the whole chain.
///
/// Every tick a distribution is fitted to the chain nearest the preferred
/// tenor. Each option inside the delta bands is scored by its expected
/// return as a percentage of premium, and the five largest mispricings
/// are taken: bought when the expectation is positive, sold when it is
/// negative.
pub struct RndStrategy {
    params: RndStrategyParams,
}

impl RndStrategy {
    pub fn new(mut params: RndStrategyParams) -> Self {
        if params.minputdelta > params.maxputdelta {
            std::mem::swap(&mut params.minputdelta, &mut params.maxputdelta);
        }
        Self { params }
    }

    fn score<'a>(
        &self,
        distribution: &RndDistribution,
        quote: &'a OptionQuote,
        scored: &mut Vec<(f64, f64, &'a OptionQuote)>,
    ) {
        let premium = quote.midprice().to_f64().unwrap_or(0.0);
        if premium <= 0.0 {
            return;
        }
        let percent = distribution.expected_return(quote) / premium * 100.0;
        scored.push((percent.abs(), percent, quote));
    }
}

impl Strategy for RndStrategy {
    fn handle_event(
        &mut self,
        _portfolio: &PortfolioSnapshot,
        event: &Event,
    ) -> Result<Vec<Order>, StrategyError> {
        let expiry = match event.find_expiry(self.params.dte, false) {
            Some(expiry) => expiry,
            None => return Ok(Vec::new()),
        };
        let chain = match event.chains().chain(expiry) {
            Some(chain) => chain,
            None => return Ok(Vec::new()),
        };
        let distribution = match RndDistribution::fit(chain) {
            Ok(distribution) => distribution,
            Err(error) => {
                tracing::warn!("RNDStrategy: No fit for {} chain: {}", expiry, error);
                return Ok(Vec::new());
            }
        };

        let mut scored = Vec::new();
        for quote in chain.calls() {
            match quote.delta {
                Some(delta)
                    if delta >= self.params.mincalldelta && delta <= self.params.maxcalldelta =>
                {
                    self.score(&distribution, quote, &mut scored);
                }
                _ => {}
            }
        }
        for quote in chain.puts() {
            match quote.delta {
                Some(delta)
                    if delta >= self.params.minputdelta && delta <= self.params.maxputdelta =>
                {
                    self.score(&distribution, quote, &mut scored);
                }
                _ => {}
            }
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let orders = scored
            .into_iter()
            .take(5)
            .map(|(_, percent, quote)| {
                let quantity = if percent >= 0.0 {
                    self.params.possize
                } else {
                    -self.params.possize
                };
                tracing::debug!(
                    "RNDStrategy: {} expects {:.2}% of premium, taking {}",
                    quote.symbol,
                    percent,
                    quantity
                );
                Order::new(&quote.symbol, quantity)
            })
            .collect();
        Ok(orders)
    }

    fn unique_id(&self) -> String {
        format!(
            "RNDStrategy(DTE:{};Pos:{};CallDelta:{}-{};PutDelta:{}-{})",
            self.params.dte,
            self.params.possize,
            self.params.mincalldelta,
            self.params.maxcalldelta,
            self.params.minputdelta,
            self.params.maxputdelta
        )
    }
}
