//! Handler for the `stream` command.

use std::io::IsTerminal;

use dialoguer::Password;
use tokio::signal;
use tracing::info;

use crate::app::run_streamer;
use crate::cli::{connector_for, StreamArgs};
use crate::config::{Config, USERNAME_ENV};
use crate::dispatcher::Dispatcher;
use crate::domain::Credentials;
use crate::error::{ConfigError, Result};

/// Apply command-line overrides to the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &StreamArgs) {
    if let Some(market) = args.market {
        config.instrument.market = market;
    }
    if let Some(product_type) = args.product_type {
        config.instrument.product_type = product_type;
    }
    if let Some(product) = &args.product {
        config.instrument.product.clone_from(product);
    }
    if let Some(contract) = &args.contract {
        config.instrument.contract.clone_from(contract);
    }
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs {
        config.logging.format = "json".into();
    }
    if let Some(username) = &args.username {
        config.credentials.username = Some(username.clone());
    }
}

/// Credentials from the environment, prompting for a missing password on a
/// terminal.
#[allow(clippy::result_large_err)]
fn credentials(config: &Config) -> Result<Credentials> {
    if let Some(credentials) = config.credentials() {
        return Ok(credentials);
    }
    let username = config
        .credentials
        .username
        .clone()
        .ok_or(ConfigError::MissingField {
            field: USERNAME_ENV,
        })?;
    if !std::io::stdin().is_terminal() {
        return Err(ConfigError::MissingField {
            field: crate::config::PASSWORD_ENV,
        }
        .into());
    }
    let password = Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()?;
    Ok(Credentials::new(username, password))
}

/// Execute the stream command.
pub async fn execute(args: &StreamArgs) -> Result<()> {
    let mut config = Config::load_or_default(&args.config)?;
    apply_overrides(&mut config, args);
    config.validate()?;
    config.init_logging();

    let credentials = credentials(&config)?;
    let key = config.instrument.key();
    let connector = connector_for(&config)?;
    info!(gateway = connector.name(), instrument = %key, "gatewire stream starting");

    let dispatcher = Dispatcher::new();
    let handle = dispatcher.handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            handle.begin_shutdown();
        }
    });

    let result = run_streamer(dispatcher, connector, credentials, key, std::io::stdout()).await;
    info!("gatewire stream stopped");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::domain::MarketKey;
    use clap::Parser;

    fn stream_args(extra: &[&str]) -> StreamArgs {
        let mut argv = vec!["gatewire", "stream"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Stream(args) => args,
            other => panic!("expected stream, got {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_instrument_fields() {
        let mut config = Config::default();
        let args = stream_args(&["--market", "EUREX", "--product", "FGBL", "--contract", "Jun13"]);
        apply_overrides(&mut config, &args);

        assert_eq!(config.instrument.market, MarketKey::Eurex);
        assert_eq!(config.instrument.product, "FGBL");
        assert_eq!(config.instrument.contract, "Jun13");
        assert_eq!(config.instrument.key().to_string(), "EUREX Future FGBL Jun13");
    }

    #[test]
    fn username_flag_wins_over_environment() {
        let mut config = Config::default();
        config.credentials.username = Some("from-env".into());
        config.credentials.password = Some("pw".into());
        apply_overrides(&mut config, &stream_args(&["--username", "from-flag"]));

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.username, "from-flag");
    }

    #[test]
    fn json_logs_flag_switches_format() {
        let mut config = Config::default();
        apply_overrides(&mut config, &stream_args(&["--json-logs", "--log-level", "debug"]));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_username_is_a_config_error() {
        let config = Config::default();
        let err = credentials(&config).unwrap_err();
        assert!(err.to_string().contains(USERNAME_ENV));
    }
}
