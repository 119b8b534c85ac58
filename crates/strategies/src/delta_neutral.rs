use crate::Strategy;
use crate::error::StrategyError;
use ledger::PortfolioSnapshot;
use market_model::{Event, OptionQuote, OptionType, Order, parse_symbol};
use rust_decimal::Decimal;
use serde::Deserialize;

fn default_longdte() -> i64 {
    30
}

fn default_longdelta() -> f64 {
    0.9
}

fn default_shortdte() -> i64 {
    3
}

fn default_shortdelta() -> f64 {
    0.3
}

fn default_closeonprofit() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeltaNeutralParams {
    /// Preferred days to expiry for the long pair.
    #[serde(default = "default_longdte")]
    pub longdte: i64,
    /// Preferred delta magnitude for the long pair.
    #[serde(default = "default_longdelta")]
    pub longdelta: f64,
    /// Preferred days to expiry for the short pair.
    #[serde(default = "default_shortdte")]
    pub shortdte: i64,
    /// Preferred delta magnitude for the short pair.
    #[serde(default = "default_shortdelta")]
    pub shortdelta: f64,
    /// Fraction of a short leg's premium to capture before buying it back.
    #[serde(default = "default_closeonprofit")]
    pub closeonprofit: Decimal,
}

/// Four legged premium harvester with offsetting deltas: a deep call and
/// deep put bought at the long tenor, near the money calls and puts sold
/// against them at the short tenor.
///
/// Each short leg is closed independently at expiry or at its profit
/// target, but a fresh pair is only written once both shorts are gone
/// and the long pair is still standing.
pub struct DeltaNeutral {
    params: DeltaNeutralParams,
    short_call_value: Decimal,
    short_put_value: Decimal,
    long_quantity: Decimal,
}

impl DeltaNeutral {
    pub fn new(params: DeltaNeutralParams) -> Self {
        Self {
            params,
            short_call_value: Decimal::ZERO,
            short_put_value: Decimal::ZERO,
            long_quantity: Decimal::ZERO,
        }
    }
}

impl Strategy for DeltaNeutral {
    fn handle_event(
        &mut self,
        portfolio: &PortfolioSnapshot,
        event: &Event,
    ) -> Result<Vec<Order>, StrategyError> {
        let mut orders = Vec::new();
        let mut long_present = false;
        let mut short_open = false;

        // --- 1. Long pair, close each leg at expiry ---
        for position in &portfolio.positions {
            if position.quantity <= Decimal::ZERO {
                continue;
            }
            let parts = parse_symbol(&position.symbol);
            if !parts.is_option() {
                continue;
            }
            if parts
                .expiry
                .is_some_and(|expiry| expiry <= event.quote_date())
            {
                orders.push(Order::new(&position.symbol, -position.quantity));
            } else {
                long_present = true;
                self.long_quantity = position.quantity;
            }
        }

        // --- 2. Short legs, each closed on its own schedule ---
        for position in &portfolio.positions {
            if position.quantity >= Decimal::ZERO {
                continue;
            }
            let parts = parse_symbol(&position.symbol);
            if !parts.is_option() {
                continue;
            }
            let opening_value = match parts.option_type {
                Some(OptionType::Call) => self.short_call_value,
                Some(OptionType::Put) => self.short_put_value,
                None => Decimal::ZERO,
            };
            let expired = parts
                .expiry
                .is_some_and(|expiry| expiry <= event.quote_date());
            let mut close = expired || !long_present;
            if !close {
                if let Some(quote) = event.option_by_symbol(&position.symbol) {
                    if !opening_value.is_zero() {
                        let ratio = position.quantity * quote.midprice() / opening_value;
                        if ratio <= Decimal::ONE - self.params.closeonprofit {
                            close = true;
                        }
                    }
                }
            }
            if close {
                orders.push(Order::new(&position.symbol, -position.quantity));
            } else {
                short_open = true;
            }
        }

        // --- 3. Replace missing pairs ---
        if !long_present {
            let call = event.find_call(self.params.longdte, self.params.longdelta, false);
            let put = event.find_put(self.params.longdte, -self.params.longdelta, false);
            if let (Some(call), Some(put)) = (call, put) {
                let combined = call.midprice() + put.midprice();
                if combined > Decimal::ZERO {
                    let quantity = (portfolio.net_value / combined).floor();
                    if quantity > Decimal::ZERO {
                        tracing::debug!(
                            "DeltaNeutral: Opening {} x {} / {}",
                            quantity,
                            call.symbol,
                            put.symbol
                        );
                        orders.push(Order::new(&call.symbol, quantity));
                        orders.push(Order::new(&put.symbol, quantity));
                        self.long_quantity = quantity;
                        long_present = true;
                    }
                }
            }
        }
        if long_present && !short_open && self.long_quantity > Decimal::ZERO {
            let call = event.find_call(self.params.shortdte, self.params.shortdelta, false);
            let put = event.find_put(self.params.shortdte, -self.params.shortdelta, false);
            if let (Some(call), Some(put)) = (call, put) {
                let quantity = -self.long_quantity;
                orders.push(Order::new(&call.symbol, quantity));
                orders.push(Order::new(&put.symbol, quantity));
                self.short_call_value = quantity * call.midprice();
                self.short_put_value = quantity * put.midprice();
            }
        }
        Ok(orders)
    }

    fn unique_id(&self) -> String {
        format!(
            "DeltaNeutral(LongDelta:{};LongDTE:{};ShortDelta:{};ShortDTE:{};CloseProfit:{})",
            self.params.longdelta,
            self.params.longdte,
            self.params.shortdelta,
            self.params.shortdte,
            self.params.closeonprofit
        )
    }
}
