use crate::Strategy;
use crate::error::StrategyError;
use ledger::PortfolioSnapshot;
use market_model::{Event, OptionQuote, Order, parse_symbol};
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

fn default_creditroll() -> i64 {
    0
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeveragedCoveredCallParams {
    /// Preferred days to expiry for the long deep call.
    #[serde(default = "default_longdte")]
    pub longdte: i64,
    /// Preferred delta for the long deep call.
    #[serde(default = "default_longdelta")]
    pub longdelta: f64,
    /// Preferred days to expiry for the short call.
    #[serde(default = "default_shortdte")]
    pub shortdte: i64,
    /// Preferred delta for the short call.
    #[serde(default = "default_shortdelta")]
    pub shortdelta: f64,
    /// Fraction of the short premium to capture before buying it back.
    /// At the default of 1 the short is only closed at expiry.
    #[serde(default = "default_closeonprofit")]
    pub closeonprofit: Decimal,
    /// When 1, a replacement short must collect at least what the buy
    /// back cost. Candidates below that are swapped for the call whose
    /// premium is closest to the target.
    #[serde(default = "default_creditroll")]
    pub creditroll: i64,
}

/// Poor man's covered call: a deep in the money long call stands in for
/// shares, financed premium by premium through short calls written
/// against it.
///
/// The short leg is bought back at expiry, when the long leg goes away,
/// or once its value has decayed past the configured profit fraction.
/// A replacement is written the same tick whenever the long leg is in
/// place.
pub struct LeveragedCoveredCall {
    params: LeveragedCoveredCallParams,
    /// Contract value of the short leg when it was written, negative.
    short_position_value: Decimal,
    long_quantity: Decimal,
}

impl LeveragedCoveredCall {
    pub fn new(params: LeveragedCoveredCallParams) -> Self {
        Self {
            params,
            short_position_value: Decimal::ZERO,
            long_quantity: Decimal::ZERO,
        }
    }

    fn pick_short_call<'a>(
        &self,
        event: &'a Event,
        min_roll_credit: Option<Decimal>,
    ) -> Option<&'a OptionQuote> {
        let candidate = event.find_call(self.params.shortdte, self.params.shortdelta, false)?;
        if self.params.creditroll == 1 {
            if let Some(min_credit) = min_roll_credit {
                if candidate.midprice() < min_credit {
                    return event.find_call_min_credit(min_credit, self.params.shortdte, false);
                }
            }
        }
        Some(candidate)
    }
}

impl Strategy for LeveragedCoveredCall {
    fn handle_event(
        &mut self,
        portfolio: &PortfolioSnapshot,
        event: &Event,
    ) -> Result<Vec<Order>, StrategyError> {
        let mut orders = Vec::new();
        let mut long_present = false;
        let mut short_open = false;
        let mut min_roll_credit = None;

        // --- 1. Long leg, close at expiry ---
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
                tracing::debug!("LeveragedCoveredCall: Long {} reached expiry", position.symbol);
                orders.push(Order::new(&position.symbol, -position.quantity));
            } else {
                long_present = true;
                self.long_quantity = position.quantity;
            }
        }

        // --- 2. Short leg, close at expiry, orphaned, or profit target ---
        for position in &portfolio.positions {
            if position.quantity >= Decimal::ZERO {
                continue;
            }
            let parts = parse_symbol(&position.symbol);
            if !parts.is_option() {
                continue;
            }
            let expired = parts
                .expiry
                .is_some_and(|expiry| expiry <= event.quote_date());
            let today_mid = event
                .option_by_symbol(&position.symbol)
                .map(OptionQuote::midprice);
            let mut close = expired || !long_present;
            if !close {
                if let Some(mid) = today_mid {
                    if !self.short_position_value.is_zero() {
                        let ratio = position.quantity * mid / self.short_position_value;
                        if ratio <= Decimal::ONE - self.params.closeonprofit {
                            tracing::debug!(
                                "LeveragedCoveredCall: Short {} hit profit target",
                                position.symbol
                            );
                            close = true;
                        }
                    }
                }
            }
            if close {
                orders.push(Order::new(&position.symbol, -position.quantity));
                if self.params.creditroll == 1 {
                    min_roll_credit = today_mid;
                }
            } else {
                short_open = true;
            }
        }

        // --- 3. Replace missing legs ---
        if !long_present {
            if let Some(long_call) =
                event.find_call(self.params.longdte, self.params.longdelta, false)
            {
                let mid = long_call.midprice();
                if mid > Decimal::ZERO {
                    let quantity = (portfolio.net_value / mid).floor();
                    if quantity > Decimal::ZERO {
                        tracing::debug!(
                            "LeveragedCoveredCall: Opening {} x {}",
                            quantity,
                            long_call.symbol
                        );
                        orders.push(Order::new(&long_call.symbol, quantity));
                        self.long_quantity = quantity;
                        long_present = true;
                    }
                }
            }
        }
        if long_present && !short_open && self.long_quantity > Decimal::ZERO {
            if let Some(short_call) = self.pick_short_call(event, min_roll_credit) {
                let quantity = -self.long_quantity;
                orders.push(Order::new(&short_call.symbol, quantity));
                self.short_position_value = quantity * short_call.midprice();
            }
        }
        Ok(orders)
    }

    fn unique_id(&self) -> String {
        format!(
            "LeveragedCoveredCall(LongDelta:{};LongDTE:{};ShortDelta:{};ShortDTE:{};CloseProfit:{};CreditRoll:{})",
            self.params.longdelta,
            self.params.longdte,
            self.params.shortdelta,
            self.params.shortdte,
            self.params.closeonprofit,
            self.params.creditroll
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledger::OpenPosition;
    use market_model::{OptionChainSet, OptionType, encode_symbol};
    use rust_decimal_macros::dec;

    fn quote(
        quote_date: NaiveDate,
        expiry: NaiveDate,
        strike: Decimal,
        delta: f64,
        bid: Decimal,
        ask: Decimal,
    ) -> OptionQuote {
        OptionQuote {
            ticker: "SPY".to_string(),
            symbol: encode_symbol("SPY", expiry, OptionType::Call, strike),
            expiry,
            strike,
            option_type: OptionType::Call,
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

    fn params() -> LeveragedCoveredCallParams {
        LeveragedCoveredCallParams {
            longdte: 30,
            longdelta: 0.9,
            shortdte: 3,
            shortdelta: 0.3,
            closeonprofit: dec!(1),
            creditroll: 0,
        }
    }

    fn first_day_event() -> Event {
        let quote_date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let long_expiry = NaiveDate::from_ymd_opt(2021, 7, 1).unwrap();
        let short_expiry = NaiveDate::from_ymd_opt(2021, 6, 4).unwrap();
        let mut chains = OptionChainSet::new("SPY", quote_date);
        chains.add_option(quote(
            quote_date,
            long_expiry,
            dec!(80),
            0.9,
            dec!(19.90),
            dec!(20.10),
        ));
        chains.add_option(quote(
            quote_date,
            short_expiry,
            dec!(105),
            0.3,
            dec!(1.90),
            dec!(2.10),
        ));
        Event::new("SPY", quote_date, dec!(100), chains)
    }

    #[test]
    fn first_tick_opens_both_legs() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(10000),
            net_value: dec!(10000),
            positions: Vec::new(),
        };
        let mut strategy = LeveragedCoveredCall::new(params());
        let orders = strategy.handle_event(&snapshot, &first_day_event()).unwrap();
        // Long mid is 2000 per contract, 10000 of equity buys 5.
        assert_eq!(
            orders,
            vec![
                Order::new("SPY:2021:07:01:CALL:80", dec!(5)),
                Order::new("SPY:2021:06:04:CALL:105", dec!(-5)),
            ]
        );
        assert_eq!(strategy.short_position_value, dec!(-1000));
    }

    #[test]
    fn buys_back_the_short_at_the_profit_target() {
        let mut strategy = LeveragedCoveredCall::new(LeveragedCoveredCallParams {
            closeonprofit: dec!(0.5),
            ..params()
        });
        let open_snapshot = PortfolioSnapshot {
            cash: dec!(10000),
            net_value: dec!(10000),
            positions: Vec::new(),
        };
        strategy
            .handle_event(&open_snapshot, &first_day_event())
            .unwrap();

        let quote_date = NaiveDate::from_ymd_opt(2021, 6, 2).unwrap();
        let short_expiry = NaiveDate::from_ymd_opt(2021, 6, 4).unwrap();
        let mut chains = OptionChainSet::new("SPY", quote_date);
        // The written 105 decayed to a mid of 100, half the 200 collected.
        chains.add_option(quote(
            quote_date,
            short_expiry,
            dec!(105),
            0.28,
            dec!(0.90),
            dec!(1.10),
        ));
        chains.add_option(quote(
            quote_date,
            short_expiry,
            dec!(106),
            0.30,
            dec!(1.40),
            dec!(1.60),
        ));
        let event = Event::new("SPY", quote_date, dec!(100), chains);
        let snapshot = PortfolioSnapshot {
            cash: dec!(1000),
            net_value: dec!(10000),
            positions: vec![
                OpenPosition {
                    symbol: "SPY:2021:07:01:CALL:80".to_string(),
                    quantity: dec!(5),
                },
                OpenPosition {
                    symbol: "SPY:2021:06:04:CALL:105".to_string(),
                    quantity: dec!(-5),
                },
            ],
        };
        let orders = strategy.handle_event(&snapshot, &event).unwrap();
        assert_eq!(
            orders,
            vec![
                Order::new("SPY:2021:06:04:CALL:105", dec!(5)),
                Order::new("SPY:2021:06:04:CALL:106", dec!(-5)),
            ]
        );
        assert_eq!(strategy.short_position_value, dec!(-750));
    }

    #[test]
    fn closes_everything_when_the_long_reaches_expiry() {
        let quote_date = NaiveDate::from_ymd_opt(2021, 7, 1).unwrap();
        let chains = OptionChainSet::new("SPY", quote_date);
        let event = Event::new("SPY", quote_date, dec!(100), chains);
        let snapshot = PortfolioSnapshot {
            cash: dec!(1000),
            net_value: dec!(10000),
            positions: vec![
                OpenPosition {
                    symbol: "SPY:2021:07:01:CALL:80".to_string(),
                    quantity: dec!(5),
                },
                OpenPosition {
                    symbol: "SPY:2021:07:02:CALL:105".to_string(),
                    quantity: dec!(-5),
                },
            ],
        };
        let mut strategy = LeveragedCoveredCall::new(params());
        let orders = strategy.handle_event(&snapshot, &event).unwrap();
        assert_eq!(
            orders,
            vec![
                Order::new("SPY:2021:07:01:CALL:80", dec!(-5)),
                Order::new("SPY:2021:07:02:CALL:105", dec!(5)),
            ]
        );
    }

    #[test]
    fn credit_roll_rejects_a_cheaper_replacement() {
        let mut strategy = LeveragedCoveredCall::new(LeveragedCoveredCallParams {
            creditroll: 1,
            ..params()
        });
        strategy.long_quantity = dec!(5);
        strategy.short_position_value = dec!(-1000);

        let quote_date = NaiveDate::from_ymd_opt(2021, 6, 4).unwrap();
        let next_expiry = NaiveDate::from_ymd_opt(2021, 6, 7).unwrap();
        let mut chains = OptionChainSet::new("SPY", quote_date);
        // Expiring short, bought back today at a mid of 120.
        chains.add_option(quote(
            quote_date,
            quote_date,
            dec!(105),
            0.55,
            dec!(1.10),
            dec!(1.30),
        ));
        // Delta pick collects only 80, the 140 credit is closer to the 120 paid.
        chains.add_option(quote(
            quote_date,
            next_expiry,
            dec!(107),
            0.30,
            dec!(0.70),
            dec!(0.90),
        ));
        chains.add_option(quote(
            quote_date,
            next_expiry,
            dec!(105),
            0.45,
            dec!(1.30),
            dec!(1.50),
        ));
        let event = Event::new("SPY", quote_date, dec!(106), chains);
        let snapshot = PortfolioSnapshot {
            cash: dec!(1000),
            net_value: dec!(10000),
            positions: vec![
                OpenPosition {
                    symbol: "SPY:2021:07:01:CALL:80".to_string(),
                    quantity: dec!(5),
                },
                OpenPosition {
                    symbol: "SPY:2021:06:04:CALL:105".to_string(),
                    quantity: dec!(-5),
                },
            ],
        };
        let orders = strategy.handle_event(&snapshot, &event).unwrap();
        assert_eq!(
            orders,
            vec![
                Order::new("SPY:2021:06:04:CALL:105", dec!(5)),
                Order::new("SPY:2021:06:07:CALL:105", dec!(-5)),
            ]
        );
    }
}
