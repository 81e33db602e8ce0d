//! Time-and-sales trade prints.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::money::{Price, Quantity};

/// One trade print: last traded price and last traded quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub price: Price,
    pub quantity: Quantity,
}

impl Tick {
    #[must_use]
    pub const fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LTP = {} : LTQ = {}", self.price, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tick_renders_as_console_line() {
        let tick = Tick::new(dec!(1475.25), 4);
        assert_eq!(tick.to_string(), "LTP = 1475.25 : LTQ = 4");
    }
}
