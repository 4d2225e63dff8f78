//! Top-level error for an export run.

use crate::config::ConfigError;
use crate::export::WriteError;
use crate::provider::ApiError;
use crate::symbols::SymbolError;
use thiserror::Error;

/// Any failure that aborts an export run.
///
/// API failures carry the operation and its subject (a symbol, or a
/// description of a symbol chunk) so the error chain names what was lost.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Symbols(#[from] SymbolError),

    #[error("{operation} for {subject}")]
    Api {
        operation: String,
        subject: String,
        #[source]
        source: ApiError,
    },

    #[error("build http client")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Write(#[from] WriteError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::io;

    /// Every message in the error chain, outermost first.
    fn chain(err: &dyn StdError) -> Vec<String> {
        let mut links = vec![err.to_string()];
        let mut cur = err.source();
        while let Some(e) = cur {
            links.push(e.to_string());
            cur = e.source();
        }
        links
    }

    #[test]
    fn api_cause_is_reported_once() {
        let err = ExportError::Api {
            operation: "get quotes".into(),
            subject: "AAPL".into(),
            source: ApiError::Decode("boom".into()),
        };
        let links = chain(&err);
        assert_eq!(links, vec!["get quotes for AAPL", "unexpected response: boom"]);
        assert_eq!(links.iter().filter(|l| l.contains("boom")).count(), 1);
    }

    #[test]
    fn write_error_names_path_then_cause() {
        let err = ExportError::from(WriteError::CreateDir {
            path: "out/data_1D".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(chain(&err), vec!["create directory out/data_1D", "denied"]);
    }

    #[test]
    fn config_error_is_not_rewrapped() {
        let err = ExportError::from(ConfigError::Invalid(
            "quotes.page_limit must be at least 1".into(),
        ));
        assert_eq!(
            chain(&err),
            vec!["invalid config: quotes.page_limit must be at least 1"]
        );
    }
}
