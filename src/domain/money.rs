//! Price and quantity representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Contract quantities are whole lots.
pub type Quantity = i64;
