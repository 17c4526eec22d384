//! Structured observability hooks for review sessions.
//!
//! - `SessionSpan`: RAII guard tagging events with the session and artifact
//! - `emit_*`: one function per lifecycle event (open, close, submit, ...)
//!
//! Filter with `RUST_LOG=rubricdash_core=debug`.

use tracing::{info, warn};

use crate::domain::{ArtifactId, ArtifactType, ProjectId};

/// RAII guard that enters a session-scoped tracing span.
///
/// ```ignore
/// let _span = SessionSpan::enter(session_id, &artifact_id);
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    pub fn enter(session_id: uuid::Uuid, artifact_id: &ArtifactId) -> Self {
        let span = tracing::info_span!(
            "rubricdash.session",
            session_id = %session_id,
            artifact_id = %artifact_id,
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a review session opened on an artifact.
pub fn emit_session_opened(artifact_type: ArtifactType, artifact_id: &ArtifactId, editable: bool) {
    info!(
        event = "session.opened",
        artifact_type = %artifact_type,
        artifact_id = %artifact_id,
        editable = editable,
    );
}

/// Emit event: a session closed, with whether the draft was committed.
pub fn emit_session_closed(artifact_id: &ArtifactId, committed: bool) {
    info!(event = "session.closed", artifact_id = %artifact_id, committed = committed);
}

/// Emit event: a review was accepted by the backend.
pub fn emit_review_submitted(artifact_type: ArtifactType, artifact_id: &ArtifactId, rating: f64) {
    info!(
        event = "review.submitted",
        artifact_type = %artifact_type,
        artifact_id = %artifact_id,
        rating = rating,
    );
}

/// Emit event: review submission failed (warning level).
pub fn emit_review_save_failed(artifact_id: &ArtifactId, error: &dyn std::fmt::Display) {
    warn!(event = "review.save_failed", artifact_id = %artifact_id, error = %error);
}

/// Emit event: the aggregate snapshot was replaced.
pub fn emit_aggregate_refreshed(artifact_type: ArtifactType, review_count: u64, overall: f64) {
    info!(
        event = "aggregate.refreshed",
        artifact_type = %artifact_type,
        review_count = review_count,
        overall_score = overall,
    );
}

/// Emit event: aggregate refresh failed; the previous snapshot is kept.
pub fn emit_aggregate_refresh_failed(artifact_type: ArtifactType, error: &dyn std::fmt::Display) {
    warn!(event = "aggregate.refresh_failed", artifact_type = %artifact_type, error = %error);
}

/// Emit event: a project-level rubric evaluation was stored.
pub fn emit_evaluation_saved(artifact_type: ArtifactType, project_id: &ProjectId, overall: f64) {
    info!(
        event = "evaluation.saved",
        artifact_type = %artifact_type,
        project_id = %project_id,
        overall_score = overall,
    );
}
