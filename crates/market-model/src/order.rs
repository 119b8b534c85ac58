use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A signed quantity of a symbol to trade. Positive buys, negative sells or
/// writes short. Pure value type, no identity beyond its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub quantity: Decimal,
}

impl Order {
    pub fn new(symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.symbol, self.quantity)
    }
}
