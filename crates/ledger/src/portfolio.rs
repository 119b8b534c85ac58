use chrono::NaiveDate;
use market_model::{Event, OptionType, Order, parse_symbol};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Last-seen pricing memo for one held symbol.
#[derive(Debug, Clone)]
struct Mark {
    price: Decimal,
    quote_date: Option<NaiveDate>,
    /// None for the underlying, which never expires.
    expiry: Option<NaiveDate>,
}

/// One (date, net value) sample. `date` is None for the synthetic starting
/// sample recorded before any event.
#[derive(Debug, Clone, Serialize)]
pub struct EquitySample {
    pub date: Option<NaiveDate>,
    pub net_value: Decimal,
}

/// An open (symbol, quantity) pair inside a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub quantity: Decimal,
}

/// The read-only view of a portfolio handed to a strategy each tick.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,
    pub net_value: Decimal,
    pub positions: Vec<OpenPosition>,
}

impl PortfolioSnapshot {
    /// Held quantity for a symbol, zero when flat.
    pub fn quantity(&self, symbol: &str) -> Decimal {
        self.positions
            .iter()
            .find(|position| position.symbol == symbol)
            .map(|position| position.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Cash, positions, and equity history for exactly one strategy instance.
///
/// Its sole responsibility is to keep the books exact across any sequence of
/// buys, sells, short writes, and calendar-driven expiry settlement.
#[derive(Debug, Clone)]
pub struct Portfolio {
    cash: Decimal,
    holdings: HashMap<String, Decimal>,
    marks: HashMap<String, Mark>,
    history: Vec<EquitySample>,
}

impl Portfolio {
    /// Creates a portfolio seeded with `starting_cash` and the synthetic
    /// starting sample in its history.
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            cash: starting_cash,
            holdings: HashMap::new(),
            marks: HashMap::new(),
            history: vec![EquitySample {
                date: None,
                net_value: starting_cash,
            }],
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Held quantity for a symbol, zero when flat.
    pub fn position(&self, symbol: &str) -> Decimal {
        self.holdings
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Open (symbol, quantity) pairs. A symbol is present iff its quantity is
    /// non-zero.
    pub fn open_positions(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.holdings
            .iter()
            .map(|(symbol, quantity)| (symbol.as_str(), *quantity))
    }

    pub fn history(&self) -> &[EquitySample] {
        &self.history
    }

    /// Cash plus the marked value of every open position.
    pub fn net_value(&self) -> Decimal {
        let positions_value: Decimal = self
            .holdings
            .iter()
            .map(|(symbol, quantity)| {
                let mark = self
                    .marks
                    .get(symbol)
                    .map(|mark| mark.price)
                    .unwrap_or_default();
                *quantity * mark
            })
            .sum();
        self.cash + positions_value
    }

    /// Percent return of the live net value over the first recorded sample.
    pub fn performance(&self) -> Decimal {
        let initial = self
            .history
            .first()
            .map(|sample| sample.net_value)
            .unwrap_or_default();
        if initial.is_zero() {
            return Decimal::ZERO;
        }
        (self.net_value() - initial) / initial * Decimal::ONE_HUNDRED
    }

    /// Largest peak-to-trough percent decline across the recorded history,
    /// zero when the history never dips below a prior peak.
    pub fn max_drawdown(&self) -> Decimal {
        let mut peak = Decimal::ZERO;
        let mut worst = Decimal::ZERO;
        for sample in &self.history {
            if sample.net_value > peak {
                peak = sample.net_value;
            }
            if !peak.is_zero() {
                let drawdown = (sample.net_value - peak) / peak * Decimal::ONE_HUNDRED;
                if drawdown < worst {
                    worst = drawdown;
                }
            }
        }
        worst
    }

    /// Read-only view for a strategy tick. Positions are sorted by symbol so
    /// strategies scan them in a reproducible order.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        let mut positions: Vec<OpenPosition> = self
            .holdings
            .iter()
            .map(|(symbol, quantity)| OpenPosition {
                symbol: symbol.clone(),
                quantity: *quantity,
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        PortfolioSnapshot {
            cash: self.cash,
            net_value: self.net_value(),
            positions,
        }
    }

    /// Applies a signed quantity change at the given price.
    ///
    /// Cash moves by `-quantity * price`. A position whose resulting quantity
    /// is exactly zero is removed together with its mark. This is the only
    /// mutator of positions; order execution and settlement both route
    /// through it.
    pub fn adjust_holdings(&mut self, symbol: &str, quantity: Decimal, price: Decimal) {
        self.cash -= quantity * price;
        let new_quantity = {
            let held = self
                .holdings
                .entry(symbol.to_string())
                .or_insert(Decimal::ZERO);
            *held += quantity;
            *held
        };
        if new_quantity.is_zero() {
            self.holdings.remove(symbol);
            self.marks.remove(symbol);
        } else {
            // Seed a mark so a brand-new position values at its fill price
            // until the next refresh.
            self.marks.entry(symbol.to_string()).or_insert(Mark {
                price,
                quote_date: None,
                expiry: None,
            });
        }
    }

    /// The per-tick transaction. Step order is load-bearing: orders execute
    /// before marks refresh so new positions get marked, marks refresh before
    /// settlement so expiry uses current-day prices, and history records last
    /// so the sample reflects this tick's settlement.
    pub fn update_for_event(&mut self, orders: &[Order], event: &Event, take_assignment: bool) {
        // --- 1. Execute orders ---
        for order in orders {
            if order.symbol == event.ticker() {
                self.adjust_holdings(&order.symbol, order.quantity, event.underlying_price());
                continue;
            }
            match event.option_by_symbol(&order.symbol) {
                Some(quote) => {
                    self.adjust_holdings(&order.symbol, order.quantity, quote.midprice());
                }
                None => {
                    tracing::warn!(
                        "Order {} skipped, symbol not quoted on {}",
                        order,
                        event.quote_date()
                    );
                }
            }
        }

        // --- 2. Refresh marks ---
        // The underlying is marked even when not held, so a position opened
        // by settlement later this tick values against today's price.
        self.marks.insert(
            event.ticker().to_string(),
            Mark {
                price: event.underlying_price(),
                quote_date: Some(event.quote_date()),
                expiry: None,
            },
        );
        let held: Vec<String> = self.holdings.keys().cloned().collect();
        for symbol in &held {
            if symbol == event.ticker() {
                continue;
            }
            if let Some(quote) = event.option_by_symbol(symbol) {
                self.marks.insert(
                    symbol.clone(),
                    Mark {
                        price: quote.midprice(),
                        quote_date: Some(quote.quote_date),
                        expiry: Some(quote.expiry),
                    },
                );
            }
        }

        // --- 3. Settle expirations ---
        for symbol in held {
            let quantity = self.position(&symbol);
            if quantity.is_zero() {
                continue;
            }
            let parts = parse_symbol(&symbol);
            let (expiry, option_type, strike) =
                match (parts.expiry, parts.option_type, parts.strike) {
                    (Some(expiry), Some(option_type), Some(strike)) => {
                        (expiry, option_type, strike)
                    }
                    // Not an option (or not decodable as one): never settles.
                    _ => continue,
                };
            if parts.ticker != event.ticker() || expiry > event.quote_date() {
                continue;
            }
            self.settle_contract(&symbol, quantity, option_type, strike, event, take_assignment);
        }

        // --- 4. Record history ---
        self.history.push(EquitySample {
            date: Some(event.quote_date()),
            net_value: self.net_value(),
        });
    }

    fn settle_contract(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        option_type: OptionType,
        strike: Decimal,
        event: &Event,
        take_assignment: bool,
    ) {
        if !take_assignment {
            let last_mark = self
                .marks
                .get(symbol)
                .map(|mark| mark.price)
                .unwrap_or_default();
            tracing::debug!("Closing expired {} at last mark {}", symbol, last_mark);
            self.adjust_holdings(symbol, -quantity, last_mark);
            return;
        }

        let underlying = event.underlying_price();
        let shares = Decimal::ONE_HUNDRED * quantity;
        match option_type {
            OptionType::Call if strike < underlying => {
                tracing::debug!("Assigning {} x {} into shares at strike {}", quantity, symbol, strike);
                self.adjust_holdings(event.ticker(), shares, strike);
            }
            OptionType::Put if strike > underlying => {
                tracing::debug!("Assigning {} x {} into shares at strike {}", quantity, symbol, strike);
                self.adjust_holdings(event.ticker(), -shares, strike);
            }
            _ => {
                tracing::debug!("{} expired worthless", symbol);
            }
        }
        // The contract no longer exists once settled.
        self.adjust_holdings(symbol, -quantity, Decimal::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_model::{OptionChainSet, OptionQuote, encode_symbol};
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, day).unwrap()
    }

    fn quote(
        expiry: NaiveDate,
        quote_date: NaiveDate,
        option_type: OptionType,
        strike: Decimal,
        mid_per_share: Decimal,
    ) -> OptionQuote {
        OptionQuote {
            ticker: "SPY".to_string(),
            symbol: encode_symbol("SPY", expiry, option_type, strike),
            expiry,
            strike,
            option_type,
            bid: mid_per_share,
            ask: mid_per_share,
            open_interest: 0,
            volume: 0,
            quote_date,
            underlying_price: None,
            days_to_expiry: None,
            implied_vol: None,
            delta: None,
            gamma: None,
            theta: None,
            vega: None,
        }
    }

    fn event_with(quote_date: NaiveDate, price: Decimal, quotes: Vec<OptionQuote>) -> Event {
        let mut chains = OptionChainSet::new("SPY", quote_date);
        for q in quotes {
            chains.add_option(q);
        }
        Event::new("SPY", quote_date, price, chains)
    }

    fn call_symbol() -> String {
        encode_symbol("SPY", date(3), OptionType::Call, dec!(100))
    }

    #[test]
    fn holdings_present_iff_quantity_nonzero() {
        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio.adjust_holdings("SPY", dec!(5), dec!(10));
        assert_eq!(portfolio.position("SPY"), dec!(5));

        portfolio.adjust_holdings("SPY", dec!(-2), dec!(12));
        assert_eq!(portfolio.position("SPY"), dec!(3));

        portfolio.adjust_holdings("SPY", dec!(-3), dec!(11));
        assert_eq!(portfolio.position("SPY"), dec!(0));
        assert_eq!(portfolio.open_positions().count(), 0);

        // Going short re-creates the entry.
        portfolio.adjust_holdings("SPY", dec!(-1), dec!(11));
        assert_eq!(portfolio.position("SPY"), dec!(-1));
    }

    #[test]
    fn adjust_holdings_moves_cash_by_signed_cost() {
        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio.adjust_holdings("SPY", dec!(5), dec!(10));
        assert_eq!(portfolio.cash(), dec!(950));

        portfolio.adjust_holdings("SPY", dec!(-5), dec!(12));
        assert_eq!(portfolio.cash(), dec!(1010));
    }

    #[test]
    fn net_value_identity_holds_after_update() {
        let mut portfolio = Portfolio::new(dec!(10000));
        let symbol = call_symbol();
        let event = event_with(
            date(1),
            dec!(100),
            vec![quote(date(3), date(1), OptionType::Call, dec!(100), dec!(2))],
        );

        let orders = vec![Order::new("SPY", dec!(10)), Order::new(symbol.clone(), dec!(-1))];
        portfolio.update_for_event(&orders, &event, false);

        // cash: 10000 - 10*100 + 200 = 9200; positions: 10 SPY @ 100, -1 call @ 200.
        assert_eq!(portfolio.cash(), dec!(9200));
        assert_eq!(portfolio.net_value(), dec!(9200) + dec!(1000) - dec!(200));
        assert_eq!(
            portfolio.history().last().unwrap().net_value,
            portfolio.net_value()
        );

        // The identity also holds for an empty order list.
        let event = event_with(date(2), dec!(101), vec![]);
        portfolio.update_for_event(&[], &event, false);
        assert_eq!(portfolio.net_value(), portfolio.cash() + dec!(10) * dec!(101) - dec!(200));
    }

    #[test]
    fn unknown_order_symbol_is_skipped() {
        let mut portfolio = Portfolio::new(dec!(1000));
        let event = event_with(date(1), dec!(100), vec![]);
        let orders = vec![Order::new("SPY:2021:06:03:CALL:100", dec!(1))];
        portfolio.update_for_event(&orders, &event, false);

        assert_eq!(portfolio.cash(), dec!(1000));
        assert_eq!(portfolio.open_positions().count(), 0);
    }

    #[test]
    fn performance_is_zero_before_any_trade() {
        let portfolio = Portfolio::new(dec!(1000));
        assert_eq!(portfolio.performance(), dec!(0));
    }

    #[test]
    fn drawdown_reflects_peak_to_trough_loss() {
        let mut portfolio = Portfolio::new(dec!(100));
        // Buy one share at 100, then watch it halve.
        let event = event_with(date(1), dec!(100), vec![]);
        portfolio.update_for_event(&[Order::new("SPY", dec!(1))], &event, false);
        let event = event_with(date(2), dec!(50), vec![]);
        portfolio.update_for_event(&[], &event, false);

        assert_eq!(portfolio.max_drawdown(), dec!(-50));
        assert_eq!(portfolio.performance(), dec!(-50));
    }

    #[test]
    fn drawdown_is_zero_for_monotone_growth() {
        let mut portfolio = Portfolio::new(dec!(100));
        let event = event_with(date(1), dec!(100), vec![]);
        portfolio.update_for_event(&[Order::new("SPY", dec!(1))], &event, false);
        for (day, price) in [(2, dec!(110)), (3, dec!(125)), (4, dec!(130))] {
            let event = event_with(date(day), price, vec![]);
            portfolio.update_for_event(&[], &event, false);
        }
        assert_eq!(portfolio.max_drawdown(), dec!(0));
    }

    #[test]
    fn short_call_assignment_delivers_shares_at_strike() {
        let mut portfolio = Portfolio::new(dec!(10000));
        let symbol = call_symbol();

        let event = event_with(
            date(1),
            dec!(100),
            vec![quote(date(3), date(1), OptionType::Call, dec!(100), dec!(2))],
        );
        portfolio.update_for_event(&[Order::new(symbol.clone(), dec!(-1))], &event, true);
        assert_eq!(portfolio.cash(), dec!(10200));

        // Expiry day, deep in the money: the short call settles into -100
        // shares sold at the strike.
        let event = event_with(
            date(3),
            dec!(110),
            vec![quote(date(3), date(3), OptionType::Call, dec!(100), dec!(10))],
        );
        portfolio.update_for_event(&[], &event, true);

        assert_eq!(portfolio.position("SPY"), dec!(-100));
        assert_eq!(portfolio.position(&symbol), dec!(0));
        assert_eq!(portfolio.cash(), dec!(10200) + dec!(10000));
        // Net value marks the short shares at today's 110.
        assert_eq!(portfolio.net_value(), dec!(20200) - dec!(100) * dec!(110));
    }

    #[test]
    fn out_of_the_money_call_expires_worthless() {
        let mut portfolio = Portfolio::new(dec!(10000));
        let symbol = call_symbol();

        let event = event_with(
            date(1),
            dec!(100),
            vec![quote(date(3), date(1), OptionType::Call, dec!(100), dec!(2))],
        );
        portfolio.update_for_event(&[Order::new(symbol.clone(), dec!(-1))], &event, true);

        let event = event_with(date(3), dec!(90), vec![]);
        portfolio.update_for_event(&[], &event, true);

        assert_eq!(portfolio.position("SPY"), dec!(0));
        assert_eq!(portfolio.position(&symbol), dec!(0));
        // The full premium is kept.
        assert_eq!(portfolio.cash(), dec!(10200));
        assert_eq!(portfolio.net_value(), dec!(10200));
    }

    #[test]
    fn short_put_assignment_buys_shares_at_strike() {
        let mut portfolio = Portfolio::new(dec!(10000));
        let symbol = encode_symbol("SPY", date(3), OptionType::Put, dec!(100));

        let event = event_with(
            date(1),
            dec!(100),
            vec![quote(date(3), date(1), OptionType::Put, dec!(100), dec!(3))],
        );
        portfolio.update_for_event(&[Order::new(symbol.clone(), dec!(-1))], &event, true);
        assert_eq!(portfolio.cash(), dec!(10300));

        let event = event_with(date(3), dec!(90), vec![]);
        portfolio.update_for_event(&[], &event, true);

        // Stock is put to the holder: 100 shares bought at the strike.
        assert_eq!(portfolio.position("SPY"), dec!(100));
        assert_eq!(portfolio.cash(), dec!(10300) - dec!(10000));
        assert_eq!(portfolio.net_value(), dec!(300) + dec!(100) * dec!(90));
    }

    #[test]
    fn without_assignment_expiry_closes_at_last_mark() {
        let mut portfolio = Portfolio::new(dec!(10000));
        let symbol = call_symbol();

        let event = event_with(
            date(1),
            dec!(100),
            vec![quote(date(3), date(1), OptionType::Call, dec!(100), dec!(2))],
        );
        portfolio.update_for_event(&[Order::new(symbol.clone(), dec!(-1))], &event, false);

        // The contract is not quoted on expiry day, so the June 1 mark of 200
        // is the close price, regardless of moneyness.
        let event = event_with(date(3), dec!(110), vec![]);
        portfolio.update_for_event(&[], &event, false);

        assert_eq!(portfolio.position(&symbol), dec!(0));
        assert_eq!(portfolio.position("SPY"), dec!(0));
        assert_eq!(portfolio.cash(), dec!(10000));
        assert_eq!(portfolio.net_value(), dec!(10000));
    }

    #[test]
    fn snapshot_reports_sorted_positions_and_net_value() {
        let mut portfolio = Portfolio::new(dec!(10000));
        let event = event_with(
            date(1),
            dec!(100),
            vec![quote(date(3), date(1), OptionType::Call, dec!(100), dec!(2))],
        );
        portfolio.update_for_event(
            &[Order::new("SPY", dec!(10)), Order::new(call_symbol(), dec!(-1))],
            &event,
            false,
        );

        let snapshot = portfolio.snapshot();
        assert_eq!(snapshot.cash, portfolio.cash());
        assert_eq!(snapshot.net_value, portfolio.net_value());
        assert_eq!(snapshot.positions.len(), 2);
        assert_eq!(snapshot.quantity("SPY"), dec!(10));
        assert_eq!(snapshot.quantity(&call_symbol()), dec!(-1));
        assert!(!snapshot.is_flat());
    }
}
