//! Miette diagnostics for the final error report.

use std::path::Path;

use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::config::{PASSWORD_ENV, USERNAME_ENV};
use crate::error::{ConfigError, Error};

/// TOML syntax or type error, shown against the file contents.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(gatewire::config::parse))]
pub struct ConfigParseError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,

    #[help]
    pub help: Option<String>,
}

/// Any other failure, with a hint where one helps.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(gatewire::error))]
pub struct CommandError {
    pub message: String,

    #[help]
    pub help: Option<String>,
}

fn hint(err: &Error) -> Option<String> {
    match err {
        Error::Config(ConfigError::MissingField { field: "url" }) => {
            Some("set [gateway] url to a ws:// or wss:// address".into())
        }
        Error::Config(ConfigError::MissingField { .. }) => Some(format!(
            "set {USERNAME_ENV} and {PASSWORD_ENV} in the environment or a .env file"
        )),
        Error::Config(ConfigError::ReadFile(_)) => {
            Some("pass --config with the path to your config.toml".into())
        }
        Error::Auth(_) => Some(format!("check {USERNAME_ENV} and {PASSWORD_ENV}")),
        Error::InstrumentNotFound(_) => {
            Some("check --market, --product-type, --product and --contract".into())
        }
        Error::Init(_) | Error::WebSocket(_) => {
            Some("check that the gateway is reachable".into())
        }
        _ => None,
    }
}

/// Turn a command error into a report, reading `config_path` back for parse
/// errors so the offending span can be shown.
pub fn report(err: Error, config_path: Option<&Path>) -> Report {
    if let Error::Config(ConfigError::Parse(parse)) = &err {
        let source = config_path.and_then(|path| {
            std::fs::read_to_string(path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        });
        if let (Some(span), Some((name, content))) = (parse.span(), source) {
            return Report::new(ConfigParseError {
                message: format!("failed to parse config: {}", parse.message()),
                src: NamedSource::new(name, content),
                span: (span.start, span.end.saturating_sub(span.start)).into(),
                help: None,
            });
        }
    }

    Report::new(CommandError {
        help: hint(&err),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_errors_point_into_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[gateway]\nkind = \"carrier-pigeon\"\n").unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let err = crate::config::Config::parse(&content).unwrap_err();
        let report = report(err, Some(file.path()));

        let diagnostic = report
            .downcast_ref::<ConfigParseError>()
            .expect("parse diagnostic");
        assert!(diagnostic.message.starts_with("failed to parse config"));
        assert!(diagnostic.span.offset() >= "[gateway]\n".len());
    }

    #[test]
    fn missing_url_gets_a_hint() {
        let report = report(ConfigError::MissingField { field: "url" }.into(), None);
        let diagnostic = report.downcast_ref::<CommandError>().unwrap();
        assert_eq!(diagnostic.message, "missing required field: url");
        assert!(diagnostic.help.as_deref().unwrap().contains("[gateway] url"));
    }

    #[test]
    fn auth_failures_mention_credentials() {
        let report = report(Error::Auth("Invalid username or password".into()), None);
        let diagnostic = report.downcast_ref::<CommandError>().unwrap();
        assert!(diagnostic.help.as_deref().unwrap().contains(USERNAME_ENV));
    }
}
