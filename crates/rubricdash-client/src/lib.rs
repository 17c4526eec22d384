//! rubricdash HTTP client
//!
//! [`HttpGateway`] implements the core `ReviewGateway` against the review
//! backend's REST API, plus the project and current-user lookups the CLI
//! needs.

pub mod config;
pub mod error;
pub mod gateway;
pub mod project;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use gateway::HttpGateway;
pub use project::Project;
