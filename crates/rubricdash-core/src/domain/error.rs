//! Error taxonomy for the review core.

/// Errors reported by a [`ReviewGateway`](crate::gateway::ReviewGateway).
///
/// Every variant is recoverable: the caller may retry or discard.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("not authenticated: the session token was rejected")]
    Unauthorized,

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether the host must re-authenticate before retrying.
    pub fn is_auth(&self) -> bool {
        matches!(self, GatewayError::Unauthorized)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced by a review session or review board.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("failed to save review for {artifact_id}: {source}")]
    SaveFailed {
        artifact_id: String,
        #[source]
        source: GatewayError,
    },

    #[error("failed to save general comment: {0}")]
    GeneralCommentFailed(#[source] GatewayError),

    #[error("failed to load review data: {0}")]
    LoadFailed(#[source] GatewayError),

    #[error("failed to save rubric evaluation: {0}")]
    EvaluationFailed(#[source] GatewayError),
}

impl SessionError {
    /// The underlying gateway error.
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            SessionError::SaveFailed { source, .. } => source,
            SessionError::GeneralCommentFailed(source)
            | SessionError::LoadFailed(source)
            | SessionError::EvaluationFailed(source) => source,
        }
    }
}
