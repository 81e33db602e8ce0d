//! Handler for `check config`.

use std::path::Path;

use crate::cli::output;
use crate::config::{Config, GatewayKind, PASSWORD_ENV, USERNAME_ENV};
use crate::error::Result;

/// Validate the configuration file and summarize it without connecting.
#[allow(clippy::result_large_err)]
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Config", path.display());

    let config = Config::load(path)?;
    output::success("Configuration file is valid");

    output::section("Gateway");
    match config.gateway.kind {
        GatewayKind::Sim => {
            output::field("Kind", "simulated");
            output::field("Account", &config.sim.account);
            output::field("Ticks", format!("every {} ms", config.sim.tick_interval_ms));
            output::field(
                "Orders",
                format!("every {} ms", config.sim.order_interval_ms),
            );
            output::field("Listed", config.sim.catalog.len());
        }
        GatewayKind::Websocket => {
            output::field("Kind", "websocket");
            output::field("URL", config.gateway.url.as_deref().unwrap_or_default());
        }
    }

    output::section("Instrument");
    output::field("Key", config.instrument.key());

    output::section("Credentials");
    if config.credentials.username.is_some() {
        output::success(&format!("{USERNAME_ENV} is set"));
    } else {
        output::warning(&format!("{USERNAME_ENV} is not set"));
    }
    if config.credentials.password.is_some() {
        output::success(&format!("{PASSWORD_ENV} is set"));
    } else {
        output::warning(&format!("{PASSWORD_ENV} is not set"));
        output::note("stream will prompt for the password");
    }

    println!();
    output::note("Configuration is ready to use.");
    Ok(())
}
