use crate::error::FeedError;
use crate::source::EventSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use market_model::{Event, OptionChainSet, OptionQuote, OptionType};
use rust_decimal::Decimal;
use sqlx::FromRow;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::collections::VecDeque;
use std::time::Duration;

/// Establishes a connection pool to the MySQL quote archive.
pub async fn connect(database_url: &str) -> Result<MySqlPool, FeedError> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// One row of the `bt_OptionDataTable` quote archive.
#[derive(Debug, Clone, FromRow)]
pub struct OptionQuoteRow {
    #[sqlx(rename = "Ticker")]
    pub ticker: String,
    #[sqlx(rename = "OptionSymbol")]
    pub option_symbol: String,
    #[sqlx(rename = "OptExpDate")]
    pub exp_date: NaiveDate,
    #[sqlx(rename = "OptStrike")]
    pub strike: Decimal,
    #[sqlx(rename = "OptType")]
    pub opt_type: String,
    #[sqlx(rename = "OptBid")]
    pub bid: Decimal,
    #[sqlx(rename = "OptAsk")]
    pub ask: Decimal,
    #[sqlx(rename = "OptOpenInterest")]
    pub open_interest: i64,
    #[sqlx(rename = "OptVolume")]
    pub volume: i64,
    #[sqlx(rename = "QuoteDate")]
    pub quote_date: NaiveDate,
    #[sqlx(rename = "StockPrice")]
    pub stock_price: Decimal,
    #[sqlx(rename = "DaysToExp")]
    pub days_to_exp: Option<i64>,
    #[sqlx(rename = "GreekIV")]
    pub iv: Option<f64>,
    #[sqlx(rename = "GreekDelta")]
    pub delta: Option<f64>,
    #[sqlx(rename = "GreekGamma")]
    pub gamma: Option<f64>,
    #[sqlx(rename = "GreekTheta")]
    pub theta: Option<f64>,
    #[sqlx(rename = "GreekVega")]
    pub vega: Option<f64>,
}

impl OptionQuoteRow {
    fn into_quote(self, option_type: OptionType) -> OptionQuote {
        OptionQuote {
            ticker: self.ticker,
            symbol: self.option_symbol,
            expiry: self.exp_date,
            strike: self.strike,
            option_type,
            bid: self.bid,
            ask: self.ask,
            open_interest: self.open_interest,
            volume: self.volume,
            quote_date: self.quote_date,
            underlying_price: Some(self.stock_price),
            days_to_expiry: self.days_to_exp,
            implied_vol: self.iv,
            delta: self.delta,
            gamma: self.gamma,
            theta: self.theta,
            vega: self.vega,
        }
    }
}

/// The archive-backed event feed.
///
/// `load` pulls every quote row for one ticker over a half-open date range
/// and groups rows sharing a `QuoteDate` into one event. The underlying
/// price of the day is taken from the day's first row.
#[derive(Debug)]
pub struct DbEventFeed {
    events: VecDeque<Event>,
}

impl DbEventFeed {
    /// Loads all events for `ticker` with `from_date <= QuoteDate < to_date`.
    pub async fn load(
        pool: &MySqlPool,
        ticker: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Self, FeedError> {
        let rows = sqlx::query_as::<_, OptionQuoteRow>(
            "SELECT Ticker, OptionSymbol, OptExpDate, OptStrike, OptType, OptBid, OptAsk, \
             OptOpenInterest, OptVolume, QuoteDate, StockPrice, DaysToExp, GreekIV, \
             GreekDelta, GreekGamma, GreekTheta, GreekVega \
             FROM bt_OptionDataTable \
             WHERE Ticker = ? AND QuoteDate >= ? AND QuoteDate < ? \
             ORDER BY QuoteDate",
        )
        .bind(ticker)
        .bind(from_date)
        .bind(to_date)
        .fetch_all(pool)
        .await?;
        tracing::info!(
            "Loaded {} option rows for {} in [{}, {})",
            rows.len(),
            ticker,
            from_date,
            to_date
        );

        let events = group_rows(ticker, rows);
        tracing::info!("Grouped rows into {} daily events", events.len());
        Ok(Self {
            events: events.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for DbEventFeed {
    async fn next_event(&mut self) -> Result<Option<Event>, FeedError> {
        Ok(self.events.pop_front())
    }
}

/// Folds date-ordered quote rows into one event per quote date.
///
/// Every parseable row of a day lands in that day's chain set, the first
/// row included. Rows with an option type other than CALL or PUT are
/// dropped with a warning and do not abort the feed.
fn group_rows(ticker: &str, rows: Vec<OptionQuoteRow>) -> Vec<Event> {
    let mut events = Vec::new();
    let mut current: Option<(NaiveDate, Decimal, OptionChainSet)> = None;

    for row in rows {
        let new_day = match &current {
            Some((date, _, _)) => *date != row.quote_date,
            None => true,
        };
        if new_day {
            if let Some((date, price, chains)) = current.take() {
                events.push(Event::new(ticker, date, price, chains));
            }
            current = Some((
                row.quote_date,
                row.stock_price,
                OptionChainSet::new(ticker, row.quote_date),
            ));
        }

        let option_type = match row.opt_type.parse::<OptionType>() {
            Ok(option_type) => option_type,
            Err(error) => {
                tracing::warn!("Dropping row {}: {}", row.option_symbol, error);
                continue;
            }
        };
        if let Some((_, _, chains)) = current.as_mut() {
            chains.add_option(row.into_quote(option_type));
        }
    }
    if let Some((date, price, chains)) = current.take() {
        events.push(Event::new(ticker, date, price, chains));
    }
    events
}
