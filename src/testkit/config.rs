//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::config::{Config, SimConfig};

/// Simulated gateway with short intervals and a fixed seed.
pub fn fast_sim() -> SimConfig {
    SimConfig {
        tick_interval_ms: 5,
        order_interval_ms: 5,
        initial_orders: 3,
        seed: Some(7),
        ..SimConfig::default()
    }
}

/// Default config pointed at a [`fast_sim`] gateway.
pub fn sim_config() -> Config {
    Config {
        sim: fast_sim(),
        ..Config::default()
    }
}
