//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions so tests focus on assertions rather
//! than construction boilerplate.

use rust_decimal::Decimal;

use crate::domain::{
    BuySell, Instrument, InstrumentId, InstrumentKey, MarketKey, Order, OrderAction, OrderStatus,
    ProductKey, ProductType, SiteOrderKey, Tick,
};

/// CME / Future / ES / Mar13.
pub fn es_key() -> InstrumentKey {
    InstrumentKey::new(
        ProductKey::new(MarketKey::Cme, ProductType::Future, "ES"),
        "Mar13",
    )
}

/// The resolved instrument for [`es_key`].
pub fn es_mar13() -> Instrument {
    Instrument::new(InstrumentId::new("CME-F-ES-Mar13"), es_key())
}

/// Create a [`Tick`] from a decimal string.
///
/// Panics on an unparseable price; test input only.
pub fn tick(price: &str, quantity: i64) -> Tick {
    Tick::new(price.parse::<Decimal>().expect("tick price"), quantity)
}

/// A working 5-lot buy at 1475.25 with order number `n`.
pub fn order(n: &str) -> Order {
    Order {
        account: "ACC1".into(),
        status: OrderStatus::Working,
        action: OrderAction::Add,
        side: BuySell::Buy,
        order_quantity: 5,
        working_quantity: 5,
        limit_price: Decimal::new(147_525, 2),
        site_order_key: SiteOrderKey::new(format!("key-{n}")),
        order_number: n.to_string(),
    }
}

/// `n` orders numbered `1..=n`.
pub fn orders(n: usize) -> Vec<Order> {
    (1..=n).map(|i| order(&i.to_string())).collect()
}
