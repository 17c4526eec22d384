//! Review board: host-side state for one project and artifact type.
//!
//! Holds the ordered artifact collection a review session commits into, the
//! general comment with its own dirty tracking, and the backend aggregate.
//! The aggregate lives in a `watch` channel so a refresh can run in the
//! background while the host keeps working.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::Capability;
use crate::domain::{
    AggregateRubric, Artifact, ArtifactId, ArtifactType, GatewayError, ProjectId, SessionError,
};
use crate::gateway::{ReviewData, ReviewGateway};
use crate::obs;
use crate::observer::{NoopObserver, ReviewObserver};

/// Reviewed vs total artifacts, as shown on a project overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewProgress {
    pub reviewed: usize,
    pub total: usize,
}

impl ReviewProgress {
    pub fn is_complete(&self) -> bool {
        self.reviewed == self.total
    }
}

/// The general comment for a board and the value last saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralComment {
    saved: String,
    current: String,
}

impl GeneralComment {
    pub fn new(saved: impl Into<String>) -> Self {
        let saved = saved.into();
        Self {
            current: saved.clone(),
            saved,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn saved(&self) -> &str {
        &self.saved
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.saved
    }

    pub(crate) fn edit(&mut self, text: String) {
        self.current = text;
    }

    /// Move the baseline to `text` after the backend accepted it.
    pub(crate) fn commit(&mut self, text: String) {
        self.saved = text;
    }
}

pub struct ReviewBoard {
    gateway: Arc<dyn ReviewGateway>,
    observer: Arc<dyn ReviewObserver>,
    artifact_type: ArtifactType,
    project_id: ProjectId,
    project_name: Option<String>,
    capability: Capability,
    artifacts: Vec<Arc<Artifact>>,
    general_comment: GeneralComment,
    aggregate: Arc<watch::Sender<AggregateRubric>>,
}

impl ReviewBoard {
    /// Fetch review data and build the board.
    pub async fn load(
        gateway: Arc<dyn ReviewGateway>,
        artifact_type: ArtifactType,
        project_id: ProjectId,
        capability: Capability,
    ) -> Result<Self, SessionError> {
        let data = gateway
            .fetch_review_data(artifact_type, &project_id)
            .await
            .map_err(SessionError::LoadFailed)?;
        tracing::debug!(
            artifact_type = %artifact_type,
            project_id = %project_id,
            artifacts = data.artifacts.len(),
            "review board loaded"
        );
        Ok(Self::from_data(
            gateway,
            artifact_type,
            project_id,
            capability,
            data,
        ))
    }

    /// Build a board from already-fetched data.
    pub fn from_data(
        gateway: Arc<dyn ReviewGateway>,
        artifact_type: ArtifactType,
        project_id: ProjectId,
        capability: Capability,
        data: ReviewData,
    ) -> Self {
        let (aggregate, _) = watch::channel(data.aggregate_rubric);
        Self {
            gateway,
            observer: Arc::new(NoopObserver),
            artifact_type,
            project_id,
            project_name: data.project_name,
            capability,
            artifacts: data.artifacts.into_iter().map(Arc::new).collect(),
            general_comment: GeneralComment::new(data.general_comment),
            aggregate: Arc::new(aggregate),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReviewObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn gateway(&self) -> &Arc<dyn ReviewGateway> {
        &self.gateway
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn artifacts(&self) -> &[Arc<Artifact>] {
        &self.artifacts
    }

    pub fn artifact(&self, id: &ArtifactId) -> Option<&Arc<Artifact>> {
        self.artifacts.iter().find(|a| &a.id == id)
    }

    /// Replace the artifact with the same id, leaving every other element
    /// untouched (same `Arc`). Returns `false` when no element matched.
    pub fn replace_by_id(&mut self, artifact: Arc<Artifact>) -> bool {
        match self.artifacts.iter_mut().find(|a| a.id == artifact.id) {
            Some(slot) => {
                *slot = artifact;
                true
            }
            None => {
                tracing::warn!(artifact_id = %artifact.id, "replace_by_id: no matching artifact");
                false
            }
        }
    }

    pub fn progress(&self) -> ReviewProgress {
        ReviewProgress {
            reviewed: self.artifacts.iter().filter(|a| a.reviewed).count(),
            total: self.artifacts.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Aggregate
    // -----------------------------------------------------------------------

    /// Current aggregate snapshot.
    pub fn aggregate(&self) -> AggregateRubric {
        self.aggregate.borrow().clone()
    }

    /// Receiver that wakes whenever the aggregate is replaced.
    pub fn subscribe_aggregate(&self) -> watch::Receiver<AggregateRubric> {
        self.aggregate.subscribe()
    }

    /// Re-fetch the aggregate and wait for it. On failure the previous
    /// snapshot is kept.
    pub async fn refresh_aggregate(&self) -> Result<AggregateRubric, SessionError> {
        refresh_aggregate_into(
            Arc::clone(&self.gateway),
            Arc::clone(&self.observer),
            Arc::clone(&self.aggregate),
            self.artifact_type,
            self.project_id.clone(),
        )
        .await
        .map_err(SessionError::LoadFailed)
    }

    /// Re-fetch the aggregate in the background. Failures are logged only.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_aggregate_refresh(&self) -> JoinHandle<()> {
        let gateway = Arc::clone(&self.gateway);
        let observer = Arc::clone(&self.observer);
        let aggregate = Arc::clone(&self.aggregate);
        let artifact_type = self.artifact_type;
        let project_id = self.project_id.clone();

        tokio::spawn(async move {
            if let Err(err) =
                refresh_aggregate_into(gateway, observer, aggregate, artifact_type, project_id)
                    .await
            {
                obs::emit_aggregate_refresh_failed(artifact_type, &err);
            }
        })
    }

    // -----------------------------------------------------------------------
    // General comment
    // -----------------------------------------------------------------------

    pub fn general_comment(&self) -> &GeneralComment {
        &self.general_comment
    }

    /// Edit the general comment. Ignored for read-only callers.
    pub fn set_general_comment(&mut self, text: impl Into<String>) {
        if !self.capability.can_edit() {
            tracing::debug!("set_general_comment ignored: read-only");
            return;
        }
        self.general_comment.edit(text.into());
    }

    /// Persist the general comment. Read-only callers are a silent no-op.
    /// The saved baseline only moves on success.
    pub async fn save_general_comment(&mut self) -> Result<(), SessionError> {
        if !self.capability.can_edit() {
            tracing::debug!("save_general_comment ignored: read-only");
            return Ok(());
        }

        let comment = self.general_comment.current().to_string();
        self.gateway
            .save_general_comment(&self.project_id, self.artifact_type, &comment)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "failed to save general comment");
                SessionError::GeneralCommentFailed(err)
            })?;

        self.general_comment.commit(comment);
        tracing::info!(
            event = "general_comment.saved",
            artifact_type = %self.artifact_type,
            project_id = %self.project_id,
        );
        Ok(())
    }
}

async fn refresh_aggregate_into(
    gateway: Arc<dyn ReviewGateway>,
    observer: Arc<dyn ReviewObserver>,
    aggregate: Arc<watch::Sender<AggregateRubric>>,
    artifact_type: ArtifactType,
    project_id: ProjectId,
) -> Result<AggregateRubric, GatewayError> {
    let data = gateway
        .fetch_review_data(artifact_type, &project_id)
        .await?;
    let fresh = data.aggregate_rubric;

    aggregate.send_replace(fresh.clone());
    obs::emit_aggregate_refreshed(artifact_type, fresh.review_count, fresh.overall_score);
    observer.aggregate_refreshed(&fresh);
    Ok(fresh)
}
