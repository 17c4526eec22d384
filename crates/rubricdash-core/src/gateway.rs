//! Review store gateway: the boundary to the review backend.
//!
//! The session controller and review board only talk to the backend through
//! [`ReviewGateway`]. `rubricdash-client` provides the HTTP implementation;
//! [`crate::fakes::MemoryGateway`] provides an in-memory one for tests.
//!
//! Implementations must not retry on their own. Retry policy belongs to the
//! host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    null_as_default, AggregateRubric, Artifact, ArtifactId, ArtifactType, GatewayResult,
    ProjectId, Scores,
};
use crate::evaluation::{RubricEvaluation, RubricEvaluationSubmission};

/// Everything a review board needs for one project and artifact type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewData {
    /// Diagram endpoints name this list `diagrams`.
    #[serde(default, alias = "diagrams", deserialize_with = "null_as_default")]
    pub artifacts: Vec<Artifact>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub general_comment: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub aggregate_rubric: AggregateRubric,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// Top-level submission fields a flattened score key must never shadow.
pub const RESERVED_SUBMISSION_KEYS: [&str; 4] =
    ["artifactType", "artifactId", "rating", "comment"];

/// Payload of a single review submission.
///
/// On the wire the per-criterion scores are spread into the top-level object
/// next to `artifactType`, `artifactId`, `rating` and `comment`. Scores named
/// like one of those fields are dropped by [`ReviewSubmission::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    /// Singular artifact type (`requirement`, `useCaseDiagram`, ...).
    pub artifact_type: String,
    pub artifact_id: ArtifactId,
    pub rating: f64,
    pub comment: String,
    #[serde(flatten)]
    pub scores: Scores,
}

impl ReviewSubmission {
    pub fn new(
        artifact_type: ArtifactType,
        artifact_id: ArtifactId,
        rating: f64,
        comment: String,
        mut scores: Scores,
    ) -> Self {
        scores.retain(|key, _| {
            let reserved = RESERVED_SUBMISSION_KEYS.contains(&key.as_str());
            if reserved {
                tracing::warn!(
                    %artifact_id,
                    key = %key,
                    "dropping score that shadows a submission field"
                );
            }
            !reserved
        });
        Self {
            artifact_type: artifact_type.singular().to_string(),
            artifact_id,
            rating,
            comment,
            scores,
        }
    }
}

/// Async access to the review backend.
#[async_trait]
pub trait ReviewGateway: Send + Sync {
    /// Load artifacts, general comment, aggregate and project name.
    async fn fetch_review_data(
        &self,
        artifact_type: ArtifactType,
        project_id: &ProjectId,
    ) -> GatewayResult<ReviewData>;

    /// Persist one review.
    async fn submit_review(&self, submission: &ReviewSubmission) -> GatewayResult<()>;

    /// Persist the general comment for a project and artifact type.
    async fn save_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()>;

    /// Load the project-level rubric evaluation; `None` when none is stored.
    async fn fetch_rubric_evaluation(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
    ) -> GatewayResult<Option<RubricEvaluation>>;

    /// Persist a project-level rubric evaluation.
    async fn save_rubric_evaluation(
        &self,
        submission: &RubricEvaluationSubmission,
    ) -> GatewayResult<()>;

    /// Persist the general comment attached to a rubric evaluation.
    async fn save_rubric_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()>;
}
