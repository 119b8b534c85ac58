use crate::Strategy;
use crate::error::StrategyError;
use ledger::PortfolioSnapshot;
use market_model::{Event, Order, parse_symbol};
use rust_decimal::Decimal;
use serde::Deserialize;

fn default_dte() -> i64 {
    5
}

fn default_delta() -> f64 {
    0.3
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoveredCallParams {
    /// Preferred days to expiry for the written call.
    #[serde(default = "default_dte")]
    pub dte: i64,
    /// Preferred delta for the written call.
    #[serde(default = "default_delta")]
    pub delta: f64,
}

/// Classic covered call: buy round lots of the underlying, write one call
/// per lot, and keep the premium.
///
/// The written call is left alone until its expiry date. If it finishes in
/// the money the position is rolled into a fresh call at the preferred
/// delta and tenor, otherwise it decays off the book and a new call is
/// written against the shares on the next tick.
pub struct CoveredCall {
    params: CoveredCallParams,
}

impl CoveredCall {
    pub fn new(params: CoveredCallParams) -> Self {
        Self { params }
    }
}

impl Strategy for CoveredCall {
    fn handle_event(
        &mut self,
        portfolio: &PortfolioSnapshot,
        event: &Event,
    ) -> Result<Vec<Order>, StrategyError> {
        let mut share_quantity = Decimal::ZERO;
        let mut open_call = None;
        for position in &portfolio.positions {
            if position.symbol == event.ticker() {
                share_quantity = position.quantity;
            } else if parse_symbol(&position.symbol).is_option() {
                open_call = Some(position);
            }
        }

        if let Some(position) = open_call {
            let parts = parse_symbol(&position.symbol);
            let expired = parts
                .expiry
                .is_some_and(|expiry| expiry <= event.quote_date());
            let in_the_money = parts
                .strike
                .is_some_and(|strike| strike < event.underlying_price());
            if expired && in_the_money {
                if let Some(replacement) = event.find_call(self.params.dte, self.params.delta, false)
                {
                    tracing::debug!(
                        "CoveredCall: Rolling {} into {}",
                        position.symbol,
                        replacement.symbol
                    );
                    return Ok(vec![
                        Order::new(&position.symbol, -position.quantity),
                        Order::new(&replacement.symbol, position.quantity),
                    ]);
                }
            }
            return Ok(Vec::new());
        }

        if share_quantity.is_zero() {
            let price = event.underlying_price();
            if price <= Decimal::ZERO {
                return Ok(Vec::new());
            }
            let affordable = (portfolio.cash / price).floor();
            let share_target = affordable - affordable % Decimal::ONE_HUNDRED;
            if share_target <= Decimal::ZERO {
                return Ok(Vec::new());
            }
            if let Some(call) = event.find_call(self.params.dte, self.params.delta, false) {
                let contracts = share_target / Decimal::ONE_HUNDRED;
                tracing::debug!(
                    "CoveredCall: Opening {} shares covered by {} x {}",
                    share_target,
                    contracts,
                    call.symbol
                );
                return Ok(vec![
                    Order::new(event.ticker(), share_target),
                    Order::new(&call.symbol, -contracts),
                ]);
            }
            return Ok(Vec::new());
        }

        // Shares without a call, the previous write expired worthless.
        let lots = (share_quantity / Decimal::ONE_HUNDRED).floor();
        if lots <= Decimal::ZERO {
            return Ok(Vec::new());
        }
        if let Some(call) = event.find_call(self.params.dte, self.params.delta, false) {
            return Ok(vec![Order::new(&call.symbol, -lots)]);
        }
        Ok(Vec::new())
    }

    fn unique_id(&self) -> String {
        format!(
            "CoveredCall(Delta:{};DTE:{})",
            self.params.delta, self.params.dte
        )
    }
}
