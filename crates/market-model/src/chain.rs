use crate::option::{OptionQuote, OptionType};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Every quote for one (ticker, quote date, expiry).
///
/// The per-type strike-sorted views are built lazily: appending a quote
/// invalidates them, and the next `calls()` / `puts()` call rebuilds and
/// caches them until the next append.
#[derive(Debug, Clone, Default)]
pub struct OptionChain {
    options: Vec<OptionQuote>,
    sorted_calls: OnceLock<Vec<usize>>,
    sorted_puts: OnceLock<Vec<usize>>,
}

impl OptionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a quote and invalidates the cached sorted views. Returns the
    /// index the quote was stored at.
    pub fn add_option(&mut self, quote: OptionQuote) -> usize {
        self.sorted_calls.take();
        self.sorted_puts.take();
        self.options.push(quote);
        self.options.len() - 1
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// All quotes in insertion order.
    pub fn options(&self) -> impl Iterator<Item = &OptionQuote> {
        self.options.iter()
    }

    /// Calls sorted by strike, ascending. Ties keep insertion order.
    pub fn calls(&self) -> impl Iterator<Item = &OptionQuote> {
        self.sorted_view(OptionType::Call)
            .iter()
            .map(|&index| &self.options[index])
    }

    /// Puts sorted by strike, ascending. Ties keep insertion order.
    pub fn puts(&self) -> impl Iterator<Item = &OptionQuote> {
        self.sorted_view(OptionType::Put)
            .iter()
            .map(|&index| &self.options[index])
    }

    pub(crate) fn get(&self, index: usize) -> Option<&OptionQuote> {
        self.options.get(index)
    }

    fn sorted_view(&self, option_type: OptionType) -> &[usize] {
        let cache = match option_type {
            OptionType::Call => &self.sorted_calls,
            OptionType::Put => &self.sorted_puts,
        };
        cache.get_or_init(|| {
            let mut view: Vec<usize> = self
                .options
                .iter()
                .enumerate()
                .filter(|(_, quote)| quote.option_type == option_type)
                .map(|(index, _)| index)
                .collect();
            view.sort_by(|&a, &b| self.options[a].strike.cmp(&self.options[b].strike));
            view
        })
    }
}

/// One `OptionChain` per expiry for a single ticker on a single quote date,
/// plus a flat symbol index for O(1) lookup.
#[derive(Debug, Clone)]
pub struct OptionChainSet {
    ticker: String,
    quote_date: NaiveDate,
    chains: BTreeMap<NaiveDate, OptionChain>,
    symbols: HashMap<String, (NaiveDate, usize)>,
}

impl OptionChainSet {
    pub fn new(ticker: impl Into<String>, quote_date: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            quote_date,
            chains: BTreeMap::new(),
            symbols: HashMap::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn quote_date(&self) -> NaiveDate {
        self.quote_date
    }

    /// Routes a quote into the chain for its expiry. A quote for any other
    /// ticker is dropped, the set only ever describes one underlying.
    pub fn add_option(&mut self, quote: OptionQuote) {
        if quote.ticker != self.ticker {
            tracing::warn!(
                "Dropping quote {} for {}, chain set belongs to {}",
                quote.symbol,
                quote.ticker,
                self.ticker
            );
            return;
        }
        let expiry = quote.expiry;
        let symbol = quote.symbol.clone();
        let chain = self.chains.entry(expiry).or_default();
        let index = chain.add_option(quote);
        self.symbols.insert(symbol, (expiry, index));
    }

    /// Expiry dates present in the set, ascending.
    pub fn expiries(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.chains.keys().copied()
    }

    pub fn chain(&self, expiry: NaiveDate) -> Option<&OptionChain> {
        self.chains.get(&expiry)
    }

    /// O(1) lookup of a quote by its contract symbol.
    pub fn option_by_symbol(&self, symbol: &str) -> Option<&OptionQuote> {
        let (expiry, index) = self.symbols.get(symbol)?;
        self.chains.get(expiry)?.get(*index)
    }

    /// Total quote count across every expiry.
    pub fn total_options(&self) -> usize {
        self.chains.values().map(OptionChain::len).sum()
    }
}
