use crate::error::ModelError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a contract is a call or a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

impl FromStr for OptionType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("CALL") || s.eq_ignore_ascii_case("C") {
            Ok(OptionType::Call)
        } else if s.eq_ignore_ascii_case("PUT") || s.eq_ignore_ascii_case("P") {
            Ok(OptionType::Put)
        } else {
            Err(ModelError::UnknownOptionType(s.to_string()))
        }
    }
}

/// One contract's quote on one quote date.
///
/// Quotes are created by the data feed and never mutated afterwards. The Greek
/// fields are optional because not every historical row carries them; selection
/// helpers skip quotes that lack the field they filter on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    pub ticker: String,
    /// Unique contract id, see [`crate::symbol::encode_symbol`] for the format.
    pub symbol: String,
    pub expiry: NaiveDate,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub bid: Decimal,
    pub ask: Decimal,
    pub open_interest: i64,
    pub volume: i64,
    pub quote_date: NaiveDate,
    pub underlying_price: Option<Decimal>,
    pub days_to_expiry: Option<i64>,
    pub implied_vol: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
}

impl OptionQuote {
    /// Mid price for one contract, with the 100-share multiplier baked in.
    pub fn midprice(&self) -> Decimal {
        Decimal::ONE_HUNDRED * (self.bid + self.ask) / Decimal::TWO
    }

    /// Per-share intrinsic value at the given underlying price. Zero when
    /// out of the money.
    pub fn intrinsic_value(&self, underlying_price: Decimal) -> Decimal {
        let raw = match self.option_type {
            OptionType::Call => underlying_price - self.strike,
            OptionType::Put => self.strike - underlying_price,
        };
        raw.max(Decimal::ZERO)
    }
}
