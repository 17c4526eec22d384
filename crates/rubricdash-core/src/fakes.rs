//! In-memory fakes for the review gateway (testing only).
//!
//! [`MemoryGateway`] behaves like a minimal backend: submitted reviews are
//! written back into the stored artifacts and the aggregate is recomputed
//! from them, so a refresh after a save observes the new numbers. Rubric
//! evaluations are kept per project and type. Failures can be scripted per
//! operation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{ArtifactType, GatewayError, GatewayResult, ProjectId};
use crate::evaluation::{RubricEvaluation, RubricEvaluationSubmission};
use crate::gateway::{ReviewData, ReviewGateway, ReviewSubmission};
use crate::rubric::Rubric;
use crate::score::criteria_averages;

#[derive(Debug, Default)]
struct GatewayState {
    boards: HashMap<(ArtifactType, String), ReviewData>,
    submissions: Vec<ReviewSubmission>,
    general_comments: Vec<(String, ArtifactType, String)>,
    evaluations: HashMap<(ArtifactType, String), RubricEvaluation>,
    evaluation_submissions: Vec<RubricEvaluationSubmission>,
    fetch_calls: usize,
    fail_fetch: Option<GatewayError>,
    fail_submit: Option<GatewayError>,
    fail_general_comment: Option<GatewayError>,
    fail_evaluation: Option<GatewayError>,
}

/// In-memory review backend.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<GatewayState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the data served for one project and artifact type.
    pub fn with_review_data(
        self,
        artifact_type: ArtifactType,
        project_id: &ProjectId,
        data: ReviewData,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .boards
            .insert((artifact_type, project_id.0.clone()), data);
        self
    }

    /// Seed the stored rubric evaluation for one project and artifact type.
    pub fn with_evaluation(
        self,
        artifact_type: ArtifactType,
        project_id: &ProjectId,
        evaluation: RubricEvaluation,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .evaluations
            .insert((artifact_type, project_id.0.clone()), evaluation);
        self
    }

    /// Make every fetch fail with `err` until cleared.
    pub fn fail_fetch(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_fetch = Some(err);
    }

    /// Make every submit fail with `err` until cleared.
    pub fn fail_submit(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_submit = Some(err);
    }

    /// Make every general-comment save fail with `err` until cleared.
    pub fn fail_general_comment(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_general_comment = Some(err);
    }

    /// Make every evaluation write (criteria or general comment) fail with
    /// `err` until cleared.
    pub fn fail_evaluation(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_evaluation = Some(err);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_fetch = None;
        state.fail_submit = None;
        state.fail_general_comment = None;
        state.fail_evaluation = None;
    }

    /// Every accepted submission, in order.
    pub fn submissions(&self) -> Vec<ReviewSubmission> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// Number of submit attempts that reached the backend, failed ones excluded.
    pub fn submit_calls(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn general_comment_calls(&self) -> usize {
        self.state.lock().unwrap().general_comments.len()
    }

    /// Every accepted evaluation save, in order.
    pub fn evaluation_submissions(&self) -> Vec<RubricEvaluationSubmission> {
        self.state.lock().unwrap().evaluation_submissions.clone()
    }

    /// Stored evaluation for a project and type, if any.
    pub fn evaluation(
        &self,
        artifact_type: ArtifactType,
        project_id: &ProjectId,
    ) -> Option<RubricEvaluation> {
        self.state
            .lock()
            .unwrap()
            .evaluations
            .get(&(artifact_type, project_id.0.clone()))
            .cloned()
    }

    /// Stored data for a board, as a subsequent fetch would return it.
    pub fn review_data(&self, artifact_type: ArtifactType, project_id: &ProjectId) -> ReviewData {
        self.state
            .lock()
            .unwrap()
            .boards
            .get(&(artifact_type, project_id.0.clone()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReviewGateway for MemoryGateway {
    async fn fetch_review_data(
        &self,
        artifact_type: ArtifactType,
        project_id: &ProjectId,
    ) -> GatewayResult<ReviewData> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if let Some(err) = &state.fail_fetch {
            return Err(err.clone());
        }
        Ok(state
            .boards
            .get(&(artifact_type, project_id.0.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn submit_review(&self, submission: &ReviewSubmission) -> GatewayResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.fail_submit {
            return Err(err.clone());
        }

        for ((artifact_type, _), data) in state.boards.iter_mut() {
            if artifact_type.singular() != submission.artifact_type {
                continue;
            }
            let Some(artifact) = data
                .artifacts
                .iter_mut()
                .find(|a| a.id == submission.artifact_id)
            else {
                continue;
            };

            artifact.rating = submission.rating;
            artifact.comment = submission.comment.clone();
            artifact.scores = submission.scores.clone();
            artifact.reviewed = true;
            data.aggregate_rubric =
                criteria_averages(data.artifacts.iter(), &Rubric::for_type(*artifact_type));
        }

        state.submissions.push(submission.clone());
        Ok(())
    }

    async fn save_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.fail_general_comment {
            return Err(err.clone());
        }
        if let Some(data) = state.boards.get_mut(&(artifact_type, project_id.0.clone())) {
            data.general_comment = comment.to_string();
        }
        state
            .general_comments
            .push((project_id.0.clone(), artifact_type, comment.to_string()));
        Ok(())
    }

    async fn fetch_rubric_evaluation(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
    ) -> GatewayResult<Option<RubricEvaluation>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if let Some(err) = &state.fail_fetch {
            return Err(err.clone());
        }
        Ok(state
            .evaluations
            .get(&(artifact_type, project_id.0.clone()))
            .cloned())
    }

    async fn save_rubric_evaluation(
        &self,
        submission: &RubricEvaluationSubmission,
    ) -> GatewayResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.fail_evaluation {
            return Err(err.clone());
        }
        state
            .evaluations
            .entry((submission.rubric_type, submission.project.0.clone()))
            .or_default()
            .criteria = submission.criteria.clone();
        state.evaluation_submissions.push(submission.clone());
        Ok(())
    }

    async fn save_rubric_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.fail_evaluation {
            return Err(err.clone());
        }
        state
            .evaluations
            .entry((artifact_type, project_id.0.clone()))
            .or_default()
            .general_comment = comment.to_string();
        Ok(())
    }
}
