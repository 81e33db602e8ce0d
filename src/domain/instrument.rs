//! Symbolic instrument keys and resolved instruments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::InstrumentId;

/// Exchange a product is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketKey {
    Cme,
    Cbot,
    Nymex,
    Comex,
    Eurex,
    Ice,
    Lme,
    Sgx,
}

impl MarketKey {
    pub const ALL: [MarketKey; 8] = [
        Self::Cme,
        Self::Cbot,
        Self::Nymex,
        Self::Comex,
        Self::Eurex,
        Self::Ice,
        Self::Lme,
        Self::Sgx,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cme => "CME",
            Self::Cbot => "CBOT",
            Self::Nymex => "NYMEX",
            Self::Comex => "COMEX",
            Self::Eurex => "EUREX",
            Self::Ice => "ICE",
            Self::Lme => "LME",
            Self::Sgx => "SGX",
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown market '{s}'"))
    }
}

/// Kind of tradable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Future,
    Spread,
    Option,
    Strategy,
    Stock,
}

impl ProductType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Future => "Future",
            Self::Spread => "Spread",
            Self::Option => "Option",
            Self::Strategy => "Strategy",
            Self::Stock => "Stock",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "future" | "futures" => Ok(Self::Future),
            "spread" => Ok(Self::Spread),
            "option" | "options" => Ok(Self::Option),
            "strategy" => Ok(Self::Strategy),
            "stock" => Ok(Self::Stock),
            _ => Err(format!("unknown product type '{s}'")),
        }
    }
}

/// A product on a market, e.g. CME / Future / ES.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub market: MarketKey,
    pub product_type: ProductType,
    pub product: String,
}

impl ProductKey {
    pub fn new(market: MarketKey, product_type: ProductType, product: impl Into<String>) -> Self {
        Self {
            market,
            product_type,
            product: product.into(),
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.market, self.product_type, self.product)
    }
}

/// Symbolic lookup key: a product plus a contract month such as `Mar13`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentKey {
    #[serde(flatten)]
    pub product: ProductKey,
    pub contract: String,
}

impl InstrumentKey {
    pub fn new(product: ProductKey, contract: impl Into<String>) -> Self {
        Self {
            product,
            contract: contract.into(),
        }
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.product, self.contract)
    }
}

/// A resolved, tradable contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub name: String,
    pub key: InstrumentKey,
}

impl Instrument {
    /// Build an instrument whose display name is `<product> <contract>`.
    pub fn new(id: InstrumentId, key: InstrumentKey) -> Self {
        let name = format!("{} {}", key.product.product, key.contract);
        Self { id, name, key }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_key_parses_case_insensitively() {
        assert_eq!("cme".parse::<MarketKey>(), Ok(MarketKey::Cme));
        assert_eq!(" EUREX ".parse::<MarketKey>(), Ok(MarketKey::Eurex));
        assert!("NASDAQ".parse::<MarketKey>().is_err());
    }

    #[test]
    fn product_type_accepts_plural_forms() {
        assert_eq!("Futures".parse::<ProductType>(), Ok(ProductType::Future));
        assert_eq!("option".parse::<ProductType>(), Ok(ProductType::Option));
        assert!("bond".parse::<ProductType>().is_err());
    }

    #[test]
    fn instrument_key_display() {
        let key = InstrumentKey::new(
            ProductKey::new(MarketKey::Cme, ProductType::Future, "ES"),
            "Mar13",
        );
        assert_eq!(key.to_string(), "CME Future ES Mar13");
        let instrument = Instrument::new(InstrumentId::new("1"), key);
        assert_eq!(instrument.name, "ES Mar13");
    }

    #[test]
    fn instrument_key_deserializes_flat() {
        let json = r#"{"market":"CME","product_type":"future","product":"ES","contract":"Mar13"}"#;
        let key: InstrumentKey = serde_json::from_str(json).unwrap();
        assert_eq!(key.product.market, MarketKey::Cme);
        assert_eq!(key.contract, "Mar13");
    }
}
