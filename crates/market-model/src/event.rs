use crate::chain::{OptionChain, OptionChainSet};
use crate::dates::days_between;
use crate::option::{OptionQuote, OptionType};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One simulated trading day: the underlying's price plus every option quoted
/// that day for the ticker.
///
/// Events are produced by the data feed in strict quote-date order and are
/// immutable once yielded.
#[derive(Debug, Clone)]
pub struct Event {
    ticker: String,
    quote_date: NaiveDate,
    underlying_price: Decimal,
    chains: OptionChainSet,
}

impl Event {
    pub fn new(
        ticker: impl Into<String>,
        quote_date: NaiveDate,
        underlying_price: Decimal,
        chains: OptionChainSet,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            quote_date,
            underlying_price,
            chains,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn quote_date(&self) -> NaiveDate {
        self.quote_date
    }

    pub fn underlying_price(&self) -> Decimal {
        self.underlying_price
    }

    pub fn chains(&self) -> &OptionChainSet {
        &self.chains
    }

    /// Expiry dates quoted on this day, ascending.
    pub fn expiries(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.chains.expiries()
    }

    pub fn chain(&self, expiry: NaiveDate) -> Option<&OptionChain> {
        self.chains.chain(expiry)
    }

    /// O(1) lookup of a quote by its contract symbol.
    pub fn option_by_symbol(&self, symbol: &str) -> Option<&OptionQuote> {
        self.chains.option_by_symbol(symbol)
    }

    /// Picks the expiry whose days-to-expiry is closest to `preferred_dte`.
    ///
    /// Expiries are scanned ascending, so on a distance tie the earlier date
    /// wins. With `allow_0dte` false, same-day expiries are excluded even when
    /// they would be the closest match.
    pub fn find_expiry(&self, preferred_dte: i64, allow_0dte: bool) -> Option<NaiveDate> {
        let mut best: Option<(i64, NaiveDate)> = None;
        for expiry in self.chains.expiries() {
            let dte = days_between(self.quote_date, expiry);
            if dte == 0 && !allow_0dte {
                continue;
            }
            let distance = (dte - preferred_dte).abs();
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, expiry)),
            }
        }
        best.map(|(_, expiry)| expiry)
    }

    /// Call with delta closest to `preferred_delta` at the expiry closest to
    /// `preferred_dte`.
    pub fn find_call(
        &self,
        preferred_dte: i64,
        preferred_delta: f64,
        allow_0dte: bool,
    ) -> Option<&OptionQuote> {
        let chain = self.resolve_chain(preferred_dte, allow_0dte)?;
        closest_delta(chain.calls(), preferred_delta)
    }

    /// Put with delta closest to `preferred_delta` at the expiry closest to
    /// `preferred_dte`. Put deltas are negative, so callers pass a negative
    /// `preferred_delta`.
    pub fn find_put(
        &self,
        preferred_dte: i64,
        preferred_delta: f64,
        allow_0dte: bool,
    ) -> Option<&OptionQuote> {
        let chain = self.resolve_chain(preferred_dte, allow_0dte)?;
        closest_delta(chain.puts(), preferred_delta)
    }

    /// Call whose mid price is closest to `preferred_credit` at the resolved
    /// expiry. Used to roll a short call for at least a target credit.
    pub fn find_call_min_credit(
        &self,
        preferred_credit: Decimal,
        preferred_dte: i64,
        allow_0dte: bool,
    ) -> Option<&OptionQuote> {
        let chain = self.resolve_chain(preferred_dte, allow_0dte)?;
        let mut best: Option<(Decimal, &OptionQuote)> = None;
        for quote in chain.calls() {
            let distance = (quote.midprice() - preferred_credit).abs();
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, quote)),
            }
        }
        best.map(|(_, quote)| quote)
    }

    fn resolve_chain(&self, preferred_dte: i64, allow_0dte: bool) -> Option<&OptionChain> {
        let expiry = self.find_expiry(preferred_dte, allow_0dte)?;
        self.chains.chain(expiry)
    }
}

/// Nearest-delta scan. Quotes without a delta cannot be ranked and are
/// skipped; ties keep the first quote encountered.
fn closest_delta<'a>(
    candidates: impl Iterator<Item = &'a OptionQuote>,
    preferred_delta: f64,
) -> Option<&'a OptionQuote> {
    let mut best: Option<(f64, &OptionQuote)> = None;
    for quote in candidates {
        let delta = match quote.delta {
            Some(delta) => delta,
            None => continue,
        };
        let distance = (delta - preferred_delta).abs();
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, quote)),
        }
    }
    best.map(|(_, quote)| quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::encode_symbol;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, day).unwrap()
    }

    fn quote(
        expiry: NaiveDate,
        option_type: OptionType,
        strike: Decimal,
        mid_per_share: Decimal,
        delta: Option<f64>,
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
            quote_date: date(1),
            underlying_price: Some(dec!(420)),
            days_to_expiry: None,
            implied_vol: None,
            delta,
            gamma: None,
            theta: None,
            vega: None,
        }
    }

    fn event() -> Event {
        let mut chains = OptionChainSet::new("SPY", date(1));
        // Same-day expiry plus two future ones.
        chains.add_option(quote(date(1), OptionType::Call, dec!(420), dec!(1.0), Some(0.5)));
        chains.add_option(quote(date(4), OptionType::Call, dec!(420), dec!(2.0), Some(0.52)));
        chains.add_option(quote(date(4), OptionType::Call, dec!(425), dec!(1.2), Some(0.31)));
        chains.add_option(quote(date(4), OptionType::Call, dec!(430), dec!(0.6), None));
        chains.add_option(quote(date(4), OptionType::Put, dec!(410), dec!(1.1), Some(-0.28)));
        chains.add_option(quote(date(4), OptionType::Put, dec!(415), dec!(1.6), Some(-0.4)));
        chains.add_option(quote(date(11), OptionType::Call, dec!(420), dec!(3.0), Some(0.55)));
        Event::new("SPY", date(1), dec!(420), chains)
    }

    #[test]
    fn find_expiry_prefers_closest_dte() {
        let event = event();
        assert_eq!(event.find_expiry(3, false), Some(date(4)));
        assert_eq!(event.find_expiry(9, false), Some(date(11)));
    }

    #[test]
    fn find_expiry_skips_same_day_unless_allowed() {
        let event = event();
        assert_eq!(event.find_expiry(0, false), Some(date(4)));
        assert_eq!(event.find_expiry(0, true), Some(date(1)));
    }

    #[test]
    fn find_expiry_tie_goes_to_earlier_date() {
        // June 4 and June 8 are both two days from the preferred DTE of 5.
        let mut chains = OptionChainSet::new("SPY", date(1));
        chains.add_option(quote(date(4), OptionType::Call, dec!(420), dec!(1.0), Some(0.5)));
        chains.add_option(quote(date(8), OptionType::Call, dec!(420), dec!(1.0), Some(0.5)));
        let event = Event::new("SPY", date(1), dec!(420), chains);
        assert_eq!(event.find_expiry(5, false), Some(date(4)));
    }

    #[test]
    fn find_call_picks_nearest_delta_and_skips_missing() {
        let event = event();
        let call = event.find_call(3, 0.3, false).unwrap();
        assert_eq!(call.strike, dec!(425));

        // The 0.9 target is nearest the delta-less 430 strike's neighborhood,
        // but quotes without a delta are never selected.
        let call = event.find_call(3, 0.9, false).unwrap();
        assert_eq!(call.strike, dec!(420));
    }

    #[test]
    fn find_put_matches_negative_deltas() {
        let event = event();
        let put = event.find_put(3, -0.3, false).unwrap();
        assert_eq!(put.strike, dec!(410));
    }

    #[test]
    fn find_call_min_credit_picks_nearest_mid() {
        let event = event();
        // Mids at June 4: 200, 120, 60 per contract.
        let call = event.find_call_min_credit(dec!(130), 3, false).unwrap();
        assert_eq!(call.midprice(), dec!(120.0));
    }

    #[test]
    fn option_lookup_by_symbol() {
        let event = event();
        let symbol = encode_symbol("SPY", date(4), OptionType::Put, dec!(415));
        assert!(event.option_by_symbol(&symbol).is_some());
        assert!(event.option_by_symbol("SPY").is_none());
    }
}
