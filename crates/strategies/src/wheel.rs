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
pub struct WheelParams {
    /// Preferred days to expiry for every written option.
    #[serde(default = "default_dte")]
    pub dte: i64,
    /// Preferred delta magnitude, applied as negative for puts.
    #[serde(default = "default_delta")]
    pub delta: f64,
}

/// The wheel: sell cash secured puts until assigned, then sell covered
/// calls against the assigned shares until they are called away, and
/// start over.
///
/// Assignment is taken rather than closed out, that is the whole point
/// of the strategy. Put sizing reserves the full strike value per
/// contract less the premium collected up front.
pub struct Wheel {
    params: WheelParams,
}

impl Wheel {
    pub fn new(params: WheelParams) -> Self {
        Self { params }
    }
}

impl Strategy for Wheel {
    fn handle_event(
        &mut self,
        portfolio: &PortfolioSnapshot,
        event: &Event,
    ) -> Result<Vec<Order>, StrategyError> {
        let mut share_quantity = Decimal::ZERO;
        let mut holds_option = false;
        for position in &portfolio.positions {
            if position.symbol == event.ticker() {
                share_quantity = position.quantity;
            } else if parse_symbol(&position.symbol).is_option() {
                holds_option = true;
            }
        }

        // One short option at a time, let it run to settlement.
        if holds_option {
            return Ok(Vec::new());
        }

        if share_quantity > Decimal::ZERO {
            let lots = (share_quantity / Decimal::ONE_HUNDRED).floor();
            if lots <= Decimal::ZERO {
                return Ok(Vec::new());
            }
            if let Some(call) = event.find_call(self.params.dte, self.params.delta, false) {
                tracing::debug!("Wheel: Writing {} covered calls on {}", lots, call.symbol);
                return Ok(vec![Order::new(&call.symbol, -lots)]);
            }
            return Ok(Vec::new());
        }

        if let Some(put) = event.find_put(self.params.dte, -self.params.delta, false) {
            let collateral = Decimal::ONE_HUNDRED * put.strike - put.midprice();
            if collateral <= Decimal::ZERO {
                return Ok(Vec::new());
            }
            let contracts = (portfolio.cash / collateral).floor();
            if contracts <= Decimal::ZERO {
                return Ok(Vec::new());
            }
            tracing::debug!(
                "Wheel: Selling {} cash secured puts on {}",
                contracts,
                put.symbol
            );
            return Ok(vec![Order::new(&put.symbol, -contracts)]);
        }
        Ok(Vec::new())
    }

    fn take_assignment(&self) -> bool {
        true
    }

    fn unique_id(&self) -> String {
        format!("Wheel(Delta:{};DTE:{})", self.params.delta, self.params.dte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledger::OpenPosition;
    use market_model::{OptionChainSet, OptionQuote, OptionType, encode_symbol};
    use rust_decimal_macros::dec;

    fn quote(
        quote_date: NaiveDate,
        expiry: NaiveDate,
        strike: Decimal,
        option_type: OptionType,
        delta: f64,
        bid: Decimal,
        ask: Decimal,
    ) -> OptionQuote {
        OptionQuote {
            ticker: "SPY".to_string(),
            symbol: encode_symbol("SPY", expiry, option_type, strike),
            expiry,
            strike,
            option_type,
            bid,
            ask,
            open_interest: 100,
            volume: 10,
            quote_date,
            underlying_price: Some(dec!(100)),
            days_to_expiry: Some((expiry - quote_date).num_days()),
            implied_vol: Some(0.2),
            delta: Some(delta),
            gamma: None,
            theta: None,
            vega: None,
        }
    }

    fn event() -> Event {
        let quote_date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2021, 6, 7).unwrap();
        let mut chains = OptionChainSet::new("SPY", quote_date);
        chains.add_option(quote(
            quote_date,
            expiry,
            dec!(105),
            OptionType::Call,
            0.31,
            dec!(0.90),
            dec!(1.10),
        ));
        chains.add_option(quote(
            quote_date,
            expiry,
            dec!(100),
            OptionType::Put,
            -0.29,
            dec!(1.95),
            dec!(2.05),
        ));
        Event::new("SPY", quote_date, dec!(100), chains)
    }

    #[test]
    fn flat_book_sells_cash_secured_puts() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(20000),
            net_value: dec!(20000),
            positions: Vec::new(),
        };
        let mut strategy = Wheel::new(WheelParams { dte: 5, delta: 0.3 });
        let orders = strategy.handle_event(&snapshot, &event()).unwrap();
        // Collateral per contract is 100 * 100 - 200 premium = 9800.
        assert_eq!(orders, vec![Order::new("SPY:2021:06:07:PUT:100", dec!(-2))]);
        assert!(strategy.take_assignment());
    }

    #[test]
    fn assigned_shares_get_covered_calls() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(400),
            net_value: dec!(20400),
            positions: vec![OpenPosition {
                symbol: "SPY".to_string(),
                quantity: dec!(200),
            }],
        };
        let mut strategy = Wheel::new(WheelParams { dte: 5, delta: 0.3 });
        let orders = strategy.handle_event(&snapshot, &event()).unwrap();
        assert_eq!(orders, vec![Order::new("SPY:2021:06:07:CALL:105", dec!(-2))]);
    }

    #[test]
    fn waits_while_an_option_is_open() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(20200),
            net_value: dec!(20000),
            positions: vec![OpenPosition {
                symbol: "SPY:2021:06:07:PUT:100".to_string(),
                quantity: dec!(-2),
            }],
        };
        let mut strategy = Wheel::new(WheelParams { dte: 5, delta: 0.3 });
        let orders = strategy.handle_event(&snapshot, &event()).unwrap();
        assert!(orders.is_empty());
    }
}
