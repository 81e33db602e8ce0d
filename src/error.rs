use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway could not produce a session.
    #[error("gateway initialization failed: {0}")]
    Init(String),

    #[error("login failed: {0}")]
    Auth(String),

    /// Lookup gave up on the instrument (final failure only).
    #[error("cannot find instrument: {0}")]
    InstrumentNotFound(String),

    /// A tick batch or order event arrived with an error attached.
    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_render_field_names() {
        let err: Error = ConfigError::MissingField { field: "url" }.into();
        assert_eq!(err.to_string(), "missing required field: url");

        let err: Error = ConfigError::InvalidValue {
            field: "contract",
            reason: "must not be empty".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid value for contract: must not be empty"
        );
    }

    #[test]
    fn stage_errors_carry_reason() {
        assert_eq!(
            Error::Auth("bad password".into()).to_string(),
            "login failed: bad password"
        );
        assert_eq!(
            Error::InstrumentNotFound("no such contract".into()).to_string(),
            "cannot find instrument: no such contract"
        );
    }
}
