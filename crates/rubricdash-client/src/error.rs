//! Error types for rubricdash-client

use thiserror::Error;

use rubricdash_core::GatewayError;

/// Errors raised while configuring or using the HTTP client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Base URL, timeout or other setting is unusable
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// No bearer token was configured for an authenticated call
    #[error("no API token configured (set RUBRICDASH_TOKEN or pass --token)")]
    MissingToken,

    /// Token file could not be read
    #[error("failed to read token file {path}: {source}")]
    TokenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(String),

    /// The backend call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
