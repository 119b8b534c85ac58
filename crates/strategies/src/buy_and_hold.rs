use crate::Strategy;
use crate::error::StrategyError;
use ledger::PortfolioSnapshot;
use market_model::{Event, Order};
use rust_decimal::Decimal;

/// Buys as many underlying shares as cash allows on the first tick, then
/// holds for the rest of the run. The benchmark every option strategy is
/// measured against.
pub struct BuyAndHold;

impl BuyAndHold {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuyAndHold {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for BuyAndHold {
    fn handle_event(
        &mut self,
        portfolio: &PortfolioSnapshot,
        event: &Event,
    ) -> Result<Vec<Order>, StrategyError> {
        if !portfolio.is_flat() {
            return Ok(Vec::new());
        }
        let price = event.underlying_price();
        if price <= Decimal::ZERO {
            return Ok(Vec::new());
        }
        let shares = (portfolio.cash / price).floor();
        if shares <= Decimal::ZERO {
            return Ok(Vec::new());
        }
        tracing::debug!("BuyAndHold: Buying {} shares of {}", shares, event.ticker());
        Ok(vec![Order::new(event.ticker(), shares)])
    }

    fn unique_id(&self) -> String {
        "BuyAndHold".to_string()
    }
}
