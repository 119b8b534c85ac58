use crate::option::OptionType;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Builds the canonical contract symbol:
/// `{ticker}:{year}:{month}:{day}:{CALL|PUT}:{strike}`.
///
/// The bare ticker on its own is the symbol of the underlying.
pub fn encode_symbol(
    ticker: &str,
    expiry: NaiveDate,
    option_type: OptionType,
    strike: Decimal,
) -> String {
    format!(
        "{}:{:04}:{:02}:{:02}:{}:{}",
        ticker,
        expiry.year(),
        expiry.month(),
        expiry.day(),
        option_type,
        strike
    )
}

/// The decoded fields of a contract symbol.
///
/// Anything that is not a well-formed option symbol decodes to a sentinel
/// carrying the whole input as the ticker and nothing else, so callers can
/// treat bare tickers and malformed ids uniformly as "not an option".
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolParts {
    pub ticker: String,
    pub expiry: Option<NaiveDate>,
    pub option_type: Option<OptionType>,
    pub strike: Option<Decimal>,
}

impl SymbolParts {
    /// True when every option field decoded successfully.
    pub fn is_option(&self) -> bool {
        self.expiry.is_some() && self.option_type.is_some() && self.strike.is_some()
    }

    fn sentinel(symbol: &str) -> Self {
        Self {
            ticker: symbol.to_string(),
            expiry: None,
            option_type: None,
            strike: None,
        }
    }
}

/// Decodes a contract symbol back into its fields. Never fails: an input that
/// does not split into the six expected fields, or whose fields do not parse,
/// comes back as the sentinel for the whole input.
pub fn parse_symbol(symbol: &str) -> SymbolParts {
    decode_fields(symbol).unwrap_or_else(|| SymbolParts::sentinel(symbol))
}

fn decode_fields(symbol: &str) -> Option<SymbolParts> {
    let parts: Vec<&str> = symbol.split(':').collect();
    if parts.len() < 6 {
        return None;
    }
    let year: i32 = parts[1].parse().ok()?;
    let month: u32 = parts[2].parse().ok()?;
    let day: u32 = parts[3].parse().ok()?;
    let expiry = NaiveDate::from_ymd_opt(year, month, day)?;
    let option_type: OptionType = parts[4].parse().ok()?;
    let strike: Decimal = parts[5].parse().ok()?;
    Some(SymbolParts {
        ticker: parts[0].to_string(),
        expiry: Some(expiry),
        option_type: Some(option_type),
        strike: Some(strike),
    })
}
