//! Configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Credentials are read from the
//! `GATEWIRE_USERNAME` / `GATEWIRE_PASSWORD` environment variables (a `.env`
//! file is honoured by the binary) and never from the file itself.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::{Credentials, InstrumentKey, MarketKey, ProductKey, ProductType};
use crate::error::{ConfigError, Result};

pub const USERNAME_ENV: &str = "GATEWIRE_USERNAME";
pub const PASSWORD_ENV: &str = "GATEWIRE_PASSWORD";

/// Supported gateway backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// In-process simulated venue.
    #[default]
    Sim,
    /// JSON-over-WebSocket gateway.
    Websocket,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub kind: GatewayKind,
    /// Gateway URL, required for the websocket backend.
    #[serde(default)]
    pub url: Option<String>,
}

/// Instrument the console streamer resolves.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    #[serde(default = "default_market")]
    pub market: MarketKey,
    #[serde(default = "default_product_type")]
    pub product_type: ProductType,
    #[serde(default = "default_product")]
    pub product: String,
    #[serde(default = "default_contract")]
    pub contract: String,
}

const fn default_market() -> MarketKey {
    MarketKey::Cme
}

const fn default_product_type() -> ProductType {
    ProductType::Future
}

fn default_product() -> String {
    "ES".into()
}

fn default_contract() -> String {
    "Mar13".into()
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            market: default_market(),
            product_type: default_product_type(),
            product: default_product(),
            contract: default_contract(),
        }
    }
}

impl InstrumentConfig {
    #[must_use]
    pub fn key(&self) -> InstrumentKey {
        InstrumentKey::new(
            ProductKey::new(self.market, self.product_type, self.product.clone()),
            self.contract.clone(),
        )
    }
}

/// A product the simulated venue lists, with its contract months.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub market: MarketKey,
    pub product_type: ProductType,
    pub product: String,
    pub contracts: Vec<String>,
}

impl CatalogEntry {
    #[must_use]
    pub fn lists(&self, key: &InstrumentKey) -> bool {
        self.market == key.product.market
            && self.product_type == key.product.product_type
            && self.product.eq_ignore_ascii_case(&key.product.product)
            && self
                .contracts
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&key.contract))
    }
}

/// Simulated venue settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_order_interval_ms")]
    pub order_interval_ms: u64,
    /// Orders delivered in the book download.
    #[serde(default = "default_initial_orders")]
    pub initial_orders: usize,
    /// Fixed RNG seed for reproducible feeds.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Required password; any non-empty password is accepted when unset.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default = "default_start_price")]
    pub start_price: Decimal,
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,
    #[serde(default = "default_catalog")]
    pub catalog: Vec<CatalogEntry>,
}

const fn default_tick_interval_ms() -> u64 {
    250
}

const fn default_order_interval_ms() -> u64 {
    1_000
}

const fn default_initial_orders() -> usize {
    5
}

fn default_account() -> String {
    "SIM1".into()
}

fn default_start_price() -> Decimal {
    Decimal::new(147_500, 2) // 1475.00
}

fn default_tick_size() -> Decimal {
    Decimal::new(25, 2) // 0.25
}

fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            market: MarketKey::Cme,
            product_type: ProductType::Future,
            product: "ES".into(),
            contracts: vec!["Mar13".into(), "Jun13".into(), "Sep13".into()],
        },
        CatalogEntry {
            market: MarketKey::Cbot,
            product_type: ProductType::Future,
            product: "ZN".into(),
            contracts: vec!["Mar13".into(), "Jun13".into()],
        },
    ]
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            order_interval_ms: default_order_interval_ms(),
            initial_orders: default_initial_orders(),
            seed: None,
            password: None,
            account: default_account(),
            start_price: default_start_price(),
            tick_size: default_tick_size(),
            catalog: default_catalog(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Credentials picked up from the environment at load time.
#[derive(Debug, Clone, Default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub sim: SimConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Loaded from `GATEWIRE_USERNAME` / `GATEWIRE_PASSWORD` at runtime.
    #[serde(skip)]
    pub credentials: CredentialsConfig,
}

impl Config {
    /// Load, apply environment credentials, and validate.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without touching the environment or validating.
    #[allow(clippy::result_large_err)]
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::Parse)?)
    }

    fn apply_env(&mut self) {
        self.credentials.username = std::env::var(USERNAME_ENV).ok();
        self.credentials.password = std::env::var(PASSWORD_ENV).ok();
    }

    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.instrument.product.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "product",
                reason: "must not be empty".into(),
            }
            .into());
        }
        if self.instrument.contract.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "contract",
                reason: "must not be empty".into(),
            }
            .into());
        }

        if self.gateway.kind == GatewayKind::Websocket {
            let raw = self
                .gateway
                .url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or(ConfigError::MissingField { field: "url" })?;
            let url = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                field: "url",
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(ConfigError::InvalidValue {
                    field: "url",
                    reason: format!("expected ws:// or wss://, got {}://", url.scheme()),
                }
                .into());
            }
        }

        if self.sim.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_interval_ms",
                reason: "must be greater than 0".into(),
            }
            .into());
        }
        if self.sim.order_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "order_interval_ms",
                reason: "must be greater than 0".into(),
            }
            .into());
        }
        if self.sim.tick_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "tick_size",
                reason: "must be positive".into(),
            }
            .into());
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    /// Credentials from the environment, if both halves are set.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.credentials.username, &self.credentials.password) {
            (Some(user), Some(pass)) => Some(Credentials::new(user.clone(), pass.clone())),
            _ => None,
        }
    }

    /// Install the global tracing subscriber.
    ///
    /// Logs go to stderr; stdout is reserved for ticks and the audit log.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                let _ = fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .try_init();
            }
            _ => {
                let _ = fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .try_init();
            }
        }
    }
}
