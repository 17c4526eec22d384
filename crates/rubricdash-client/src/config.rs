//! Client configuration
//!
//! Settings come from the environment with defaults, and can be overridden
//! by the caller (the CLI maps its flags onto the builder methods).

use std::path::Path;
use std::time::Duration;

use rubricdash_core::BearerToken;

use crate::error::{ClientError, Result};

/// Environment variable holding the backend base URL
pub const ENV_API_URL: &str = "RUBRICDASH_API_URL";
/// Environment variable holding the bearer token
pub const ENV_TOKEN: &str = "RUBRICDASH_TOKEN";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "RUBRICDASH_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<BearerToken>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_API_URL) {
            Some(url) if !url.trim().is_empty() => Self::new(&url)?,
            _ => Self::default(),
        };

        if let Some(token) = lookup(ENV_TOKEN) {
            config = config.with_token(&token);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                ClientError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} is not a number: {raw:?}"))
            })?;
            config = config.with_timeout_secs(secs)?;
        }

        Ok(config)
    }

    /// Create config for a specific backend
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "base URL must start with http:// or https://: {base_url:?}"
            )));
        }
        Ok(ClientConfig {
            base_url: base_url.to_string(),
            ..Self::default()
        })
    }

    /// Set authentication token. Blank tokens clear it.
    pub fn with_token(mut self, token: &str) -> Self {
        let token = BearerToken::new(token);
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Read the token from a file (surrounding whitespace is ignored).
    pub fn with_token_file(self, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ClientError::TokenFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(self.with_token(&raw))
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Result<Self> {
        if secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }
        self.timeout_secs = secs;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL for an `/api/...` path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
