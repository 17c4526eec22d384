//! Project-level rubric evaluation.
//!
//! Next to per-artifact reviews, an evaluator can score a project's whole
//! set of artifacts of one type against a short list of named criteria. The
//! backend stores one evaluation per project and type. When none is stored
//! the evaluation starts from [`default_criteria`] with every score at 0.
//!
//! [`EvaluationTracker`] holds the edited criteria next to the last saved
//! copy, the same way [`ReviewBoard`](crate::board::ReviewBoard) tracks its
//! general comment.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::{AuthSession, Capability};
use crate::board::GeneralComment;
use crate::domain::{null_as_default, ArtifactType, ProjectId, SessionError};
use crate::gateway::ReviewGateway;
use crate::obs;
use crate::rubric::Rubric;

/// One named criterion of a project-level evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCriterion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl EvaluationCriterion {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            score: 0.0,
            comment: None,
        }
    }
}

/// A stored evaluation, as served under `evaluation` by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricEvaluation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub criteria: Vec<EvaluationCriterion>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub general_comment: String,
}

/// Body of an evaluation save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricEvaluationSubmission {
    /// Plural wire name (`stories`, `designPatterns`, ...).
    pub rubric_type: ArtifactType,
    pub criteria: Vec<EvaluationCriterion>,
    pub project: ProjectId,
    /// User id of the evaluator.
    pub evaluator: String,
}

/// Criteria a fresh evaluation starts from.
///
/// Stories, design patterns and mockups have their own project-level
/// criteria. Other types reuse the names of their per-artifact rubric.
pub fn default_criteria(artifact_type: ArtifactType) -> Vec<EvaluationCriterion> {
    let named: &[(&str, &str)] = match artifact_type {
        ArtifactType::Stories => &[
            ("User Focus", "Story clearly identifies the user role"),
            ("Value Proposition", "Story clearly states the benefit to the user"),
            ("Acceptance Criteria", "Clear criteria for when the story is complete"),
            ("Size/Scope", "Story is appropriately sized for implementation"),
            ("Independence", "Story can be implemented independently"),
        ],
        ArtifactType::DesignPatterns => &[
            ("Pattern Selection", "Appropriate pattern for the problem"),
            ("Implementation", "Correctly implements the pattern"),
            ("Flexibility", "Solution is flexible and extensible"),
            ("Complexity", "Appropriate level of complexity"),
            ("Documentation", "Well-documented rationale for pattern use"),
        ],
        ArtifactType::Mockups => &[
            ("UI/UX Design", "Follows UI/UX best practices"),
            ("Consistency", "Consistent design patterns and elements"),
            ("Flow", "Logical flow between screens"),
            ("Completeness", "Covers all required functionality"),
            ("User-Friendliness", "Intuitive and easy to use"),
        ],
        _ => {
            return Rubric::for_type(artifact_type)
                .criteria
                .iter()
                .map(|c| EvaluationCriterion::new(c.name, c.description))
                .collect()
        }
    };
    named
        .iter()
        .map(|(name, description)| EvaluationCriterion::new(*name, *description))
        .collect()
}

/// Mean criterion score; non-finite scores count as 0, an empty list is 0.
pub fn evaluation_score(criteria: &[EvaluationCriterion]) -> f64 {
    if criteria.is_empty() {
        return 0.0;
    }
    let total: f64 = criteria
        .iter()
        .map(|c| if c.score.is_finite() { c.score } else { 0.0 })
        .sum();
    total / criteria.len() as f64
}

/// Editable project-level evaluation for one project and artifact type.
pub struct EvaluationTracker {
    gateway: Arc<dyn ReviewGateway>,
    project_id: ProjectId,
    artifact_type: ArtifactType,
    capability: Capability,
    evaluator: String,
    stored: bool,
    saved: Vec<EvaluationCriterion>,
    criteria: Vec<EvaluationCriterion>,
    general_comment: GeneralComment,
}

impl EvaluationTracker {
    /// Fetch the stored evaluation for `auth`'s user, falling back to the
    /// default criteria when there is none.
    pub async fn load(
        gateway: Arc<dyn ReviewGateway>,
        project_id: ProjectId,
        artifact_type: ArtifactType,
        auth: &AuthSession,
    ) -> Result<Self, SessionError> {
        let stored = gateway
            .fetch_rubric_evaluation(&project_id, artifact_type)
            .await
            .map_err(SessionError::LoadFailed)?;
        Ok(Self::from_evaluation(
            gateway,
            project_id,
            artifact_type,
            auth.capability(),
            auth.user().id.clone(),
            stored,
        ))
    }

    pub fn from_evaluation(
        gateway: Arc<dyn ReviewGateway>,
        project_id: ProjectId,
        artifact_type: ArtifactType,
        capability: Capability,
        evaluator: impl Into<String>,
        stored: Option<RubricEvaluation>,
    ) -> Self {
        let RubricEvaluation {
            criteria,
            general_comment,
        } = stored.unwrap_or_default();
        let stored = !criteria.is_empty();
        let criteria = if stored {
            criteria
        } else {
            default_criteria(artifact_type)
        };
        tracing::debug!(
            artifact_type = %artifact_type,
            project_id = %project_id,
            stored,
            criteria = criteria.len(),
            "rubric evaluation loaded"
        );

        Self {
            gateway,
            project_id,
            artifact_type,
            capability,
            evaluator: evaluator.into(),
            stored,
            saved: criteria.clone(),
            criteria,
            general_comment: GeneralComment::new(general_comment),
        }
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn criteria(&self) -> &[EvaluationCriterion] {
        &self.criteria
    }

    /// Whether the backend holds an evaluation (as opposed to defaults).
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub fn is_dirty(&self) -> bool {
        self.criteria != self.saved
    }

    pub fn overall_score(&self) -> f64 {
        evaluation_score(&self.criteria)
    }

    pub fn general_comment(&self) -> &GeneralComment {
        &self.general_comment
    }

    /// Criterion by name, ignoring ASCII case.
    pub fn criterion(&self, name: &str) -> Option<&EvaluationCriterion> {
        self.criteria
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Set a criterion score. Returns `false` when nothing was applied:
    /// read-only caller or no criterion with that name.
    pub fn set_score(&mut self, name: &str, score: f64) -> bool {
        self.edit(name, |c| c.score = score)
    }

    /// Set a criterion comment; empty text clears it.
    pub fn set_comment(&mut self, name: &str, text: &str) -> bool {
        let comment = (!text.is_empty()).then(|| text.to_string());
        self.edit(name, |c| c.comment = comment)
    }

    fn edit(&mut self, name: &str, apply: impl FnOnce(&mut EvaluationCriterion)) -> bool {
        if !self.capability.can_edit() {
            tracing::debug!("evaluation edit ignored: read-only");
            return false;
        }
        match self
            .criteria
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        {
            Some(criterion) => {
                apply(criterion);
                true
            }
            None => {
                tracing::debug!(criterion = name, "evaluation edit ignored: unknown criterion");
                false
            }
        }
    }

    /// Persist the criteria. Returns `Ok(false)` for read-only callers.
    /// The saved copy only moves on success.
    pub async fn save(&mut self) -> Result<bool, SessionError> {
        if !self.capability.can_edit() {
            tracing::debug!("evaluation save ignored: read-only");
            return Ok(false);
        }

        let submission = RubricEvaluationSubmission {
            rubric_type: self.artifact_type,
            criteria: self.criteria.clone(),
            project: self.project_id.clone(),
            evaluator: self.evaluator.clone(),
        };
        self.gateway
            .save_rubric_evaluation(&submission)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "failed to save rubric evaluation");
                SessionError::EvaluationFailed(err)
            })?;

        self.saved = submission.criteria;
        self.stored = true;
        obs::emit_evaluation_saved(self.artifact_type, &self.project_id, self.overall_score());
        Ok(true)
    }

    /// Edit the evaluation's general comment. Ignored for read-only callers.
    pub fn set_general_comment(&mut self, text: impl Into<String>) {
        if !self.capability.can_edit() {
            tracing::debug!("evaluation general comment ignored: read-only");
            return;
        }
        self.general_comment.edit(text.into());
    }

    pub async fn save_general_comment(&mut self) -> Result<(), SessionError> {
        if !self.capability.can_edit() {
            return Ok(());
        }

        let comment = self.general_comment.current().to_string();
        self.gateway
            .save_rubric_general_comment(&self.project_id, self.artifact_type, &comment)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "failed to save evaluation general comment");
                SessionError::GeneralCommentFailed(err)
            })?;
        self.general_comment.commit(comment);
        Ok(())
    }
}
