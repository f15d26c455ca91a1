//! Custom error types for anekdot-relay

use thiserror::Error;

/// Main error type for anekdot-relay operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Notify error: {0}")]
    Notify(String),
}

impl Error {
    /// Whether the error is a transport hiccup worth retrying
    /// (connection refused/reset, timeout, broken body).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            _ => false,
        }
    }
}

/// Result type alias for anekdot-relay
pub type Result<T> = std::result::Result<T, Error>;
