//! Command-line interface definitions.

pub mod check;
pub mod diagnostic;
pub mod monitor;
pub mod output;
pub mod stream;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, GatewayKind};
use crate::domain::{MarketKey, ProductType};
use crate::error::{ConfigError, Result};
use crate::gateway::sim::SimConnector;
use crate::gateway::ws::WsConnector;
use crate::gateway::Connector;

/// Gatewire - trading gateway console clients.
#[derive(Parser, Debug)]
#[command(name = "gatewire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an instrument and print its trades until Ctrl-C
    Stream(StreamArgs),

    /// Log in and watch the order audit log until Ctrl-C
    Monitor(MonitorArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `gatewire check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `stream` subcommand.
#[derive(Parser, Debug)]
pub struct StreamArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the login name from the environment
    #[arg(short, long)]
    pub username: Option<String>,

    /// Override the instrument market (e.g. CME)
    #[arg(long)]
    pub market: Option<MarketKey>,

    /// Override the product symbol (e.g. ES)
    #[arg(long)]
    pub product: Option<String>,

    /// Override the product type (future, spread, option, strategy, stock)
    #[arg(long)]
    pub product_type: Option<ProductType>,

    /// Override the contract month (e.g. Mar13)
    #[arg(long)]
    pub contract: Option<String>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments for the `monitor` subcommand.
#[derive(Parser, Debug)]
pub struct MonitorArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Build the connector for the configured gateway backend.
#[allow(clippy::result_large_err)]
pub fn connector_for(config: &Config) -> Result<Box<dyn Connector>> {
    match config.gateway.kind {
        GatewayKind::Sim => Ok(Box::new(SimConnector::new(config.sim.clone()))),
        GatewayKind::Websocket => {
            let url = config
                .gateway
                .url
                .clone()
                .ok_or(ConfigError::MissingField { field: "url" })?;
            Ok(Box::new(WsConnector::new(url)))
        }
    }
}
