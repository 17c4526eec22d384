//! Integration tests for the review session state machine.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rubricdash_core::fakes::MemoryGateway;
use rubricdash_core::{
    AggregateRubric, Artifact, ArtifactType, Capability, GatewayError, GatewayResult, ProjectId,
    PromptAction, ReviewBoard, ReviewData, ReviewDraft, ReviewGateway, ReviewObserver,
    ReviewSession, ReviewSubmission, RubricEvaluation, RubricEvaluationSubmission, SaveOutcome,
    SessionError, SessionPhase,
};

#[derive(Debug, Clone, PartialEq)]
enum Note {
    Dirty(bool),
    Draft,
    Saved(String),
    Failed,
    Aggregate(u64),
}

#[derive(Default)]
struct RecordingObserver {
    notes: Mutex<Vec<Note>>,
}

impl RecordingObserver {
    fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    fn draft_notes(&self) -> usize {
        self.notes().iter().filter(|n| **n == Note::Draft).count()
    }

    fn dirty_flips(&self) -> Vec<bool> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Dirty(d) => Some(d),
                _ => None,
            })
            .collect()
    }
}

impl ReviewObserver for RecordingObserver {
    fn dirty_changed(&self, dirty: bool) {
        self.notes.lock().unwrap().push(Note::Dirty(dirty));
    }

    fn draft_changed(&self, _draft: &ReviewDraft) {
        self.notes.lock().unwrap().push(Note::Draft);
    }

    fn save_succeeded(&self, artifact: &Artifact) {
        self.notes
            .lock()
            .unwrap()
            .push(Note::Saved(artifact.id.to_string()));
    }

    fn save_failed(&self, _error: &SessionError) {
        self.notes.lock().unwrap().push(Note::Failed);
    }

    fn aggregate_refreshed(&self, aggregate: &AggregateRubric) {
        self.notes
            .lock()
            .unwrap()
            .push(Note::Aggregate(aggregate.review_count));
    }
}

struct Fixture {
    gateway: Arc<MemoryGateway>,
    board: ReviewBoard,
    session: ReviewSession,
    observer: Arc<RecordingObserver>,
}

async fn fixture(artifact_type: ArtifactType, capability: Capability, artifacts: Vec<Artifact>) -> Fixture {
    let project = ProjectId::from("proj-1");
    let gateway = Arc::new(MemoryGateway::new().with_review_data(
        artifact_type,
        &project,
        ReviewData {
            artifacts,
            project_name: Some("Library System".into()),
            ..Default::default()
        },
    ));
    let observer = Arc::new(RecordingObserver::default());
    let board = ReviewBoard::load(gateway.clone(), artifact_type, project, capability)
        .await
        .unwrap()
        .with_observer(observer.clone());
    let session = ReviewSession::for_board(&board).with_observer(observer.clone());
    Fixture {
        gateway,
        board,
        session,
        observer,
    }
}

fn sequence_diagrams() -> Vec<Artifact> {
    vec![
        Artifact::new("s0").with_field("text", "Login"),
        Artifact::new("a1").with_field("text", "Checkout"),
        Artifact::new("s2").with_field("text", "Logout"),
    ]
}

// ── Open and close ──

#[tokio::test]
async fn clean_close_never_prompts_or_calls_backend() {
    for capability in [Capability::Admin, Capability::ReadOnly] {
        let mut f = fixture(ArtifactType::SequenceDiagrams, capability, sequence_diagrams()).await;
        let artifact = f.board.artifacts()[1].clone();

        f.session.open(artifact);
        assert_eq!(f.session.phase(), SessionPhase::Open);

        assert_eq!(f.session.request_close(), SessionPhase::Closed);
        assert_eq!(f.gateway.submit_calls(), 0);
        assert!(f.observer.dirty_flips().is_empty());
    }
}

#[tokio::test]
async fn open_seeds_applicable_scores_with_zero() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[0].clone());

    let draft = f.session.draft().unwrap();
    assert_eq!(draft.scores.len(), 3);
    assert!(draft.scores.values().all(|v| *v == 0.0));
    assert!(!f.session.is_dirty());
}

#[tokio::test]
async fn draft_is_independent_of_the_board_artifact() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());

    f.session.set_comment("draft text");
    f.session.set_score("messageFlowScore", 5.0);

    let committed = &f.board.artifacts()[1];
    assert_eq!(committed.comment, "");
    assert!(committed.scores.is_empty());
}

// ── Dirty tracking ──

#[tokio::test]
async fn edit_then_revert_clears_dirty() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());

    f.session.set_score("messageFlowScore", 4.0);
    assert!(f.session.is_dirty());
    assert_eq!(f.session.phase(), SessionPhase::Editing);

    f.session.set_score("messageFlowScore", 0.0);
    assert!(!f.session.is_dirty());
    assert_eq!(f.session.phase(), SessionPhase::Open);

    assert_eq!(f.observer.dirty_flips(), vec![true, false]);
}

#[tokio::test]
async fn setting_an_unseeded_key_to_zero_is_not_dirty() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());

    f.session.set_score("notARubricKey", 0.0);
    assert!(!f.session.is_dirty());
}

#[tokio::test]
async fn unchanged_edits_do_not_notify() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());
    f.session.set_score("messageFlowScore", 3.0);
    f.session.set_comment("tidy");
    let drafts = f.observer.draft_notes();

    f.session.set_score("messageFlowScore", 3.0);
    f.session.set_score("completenessScore", 0.0);
    f.session.set_comment("tidy");
    assert_eq!(f.observer.draft_notes(), drafts);
    assert_eq!(f.observer.dirty_flips(), vec![true]);

    f.session.set_score("messageFlowScore", 4.0);
    assert_eq!(f.observer.draft_notes(), drafts + 1);
}

#[tokio::test]
async fn read_only_session_ignores_edits() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::ReadOnly, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());
    let before = f.session.draft().cloned();

    f.session.set_comment("should not stick");
    f.session.set_score("messageFlowScore", 5.0);

    assert_eq!(f.session.draft().cloned(), before);
    assert!(!f.session.is_dirty());
    assert_eq!(f.session.live_overall_score(), 0.0);
}

#[tokio::test]
async fn live_score_follows_applicable_criteria() {
    let artifacts = vec![
        Artifact::new("r1").with_field("type", "Functional"),
        Artifact::new("r2").with_field("type", "Non-Functional"),
    ];
    let mut f = fixture(ArtifactType::Requirements, Capability::Admin, artifacts).await;

    f.session.open(f.board.artifacts()[1].clone());
    assert!(!f.session.draft().unwrap().scores.contains_key("testabilityScore"));
    for key in ["clarityScore", "feasibilityScore", "necessityScore", "prioritizationScore"] {
        f.session.set_score(key, 4.0);
    }
    assert_eq!(f.session.live_overall_score(), 4.0);

    f.session.open(f.board.artifacts()[0].clone());
    assert!(f.session.draft().unwrap().scores.contains_key("testabilityScore"));
    for key in ["clarityScore", "feasibilityScore", "necessityScore", "prioritizationScore"] {
        f.session.set_score(key, 5.0);
    }
    assert_eq!(f.session.live_overall_score(), 4.0);
}

// ── Save ──

#[tokio::test]
async fn save_commits_merged_artifact_and_closes() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    let siblings_before: Vec<_> = f.board.artifacts().to_vec();
    f.session.open(f.board.artifacts()[1].clone());

    f.session.set_comment("good");
    f.session.set_score("messageFlowScore", 4.0);
    f.session.set_score("completenessScore", 2.0);
    f.session.set_score("umlCorrectnessScore", 3.0);

    let outcome = f.session.save(&mut f.board).await.unwrap();
    let SaveOutcome::Saved { artifact, refresh } = outcome else {
        panic!("expected a committed save");
    };
    refresh.await.unwrap();

    assert_eq!(artifact.rating, 3.0);
    assert_eq!(artifact.comment, "good");
    assert!(artifact.reviewed);
    assert_eq!(artifact.scores.get("messageFlowScore"), Some(&4.0));
    assert_eq!(artifact.scores.get("completenessScore"), Some(&2.0));
    assert_eq!(artifact.scores.get("umlCorrectnessScore"), Some(&3.0));
    assert_eq!(artifact.field_str("text"), Some("Checkout"));

    assert_eq!(f.session.phase(), SessionPhase::Closed);
    assert!(!f.session.is_dirty());

    let board = f.board.artifacts();
    assert!(Arc::ptr_eq(&board[1], &artifact));
    assert!(Arc::ptr_eq(&board[0], &siblings_before[0]));
    assert!(Arc::ptr_eq(&board[2], &siblings_before[2]));

    let submission = &f.gateway.submissions()[0];
    assert_eq!(submission.artifact_type, "sequenceDiagram");
    assert_eq!(submission.artifact_id.0, "a1");
    assert_eq!(submission.rating, 3.0);
}

#[tokio::test]
async fn save_success_refreshes_the_aggregate() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    assert_eq!(f.board.aggregate().review_count, 0);
    let mut rx = f.board.subscribe_aggregate();

    f.session.open(f.board.artifacts()[0].clone());
    f.session.set_score("messageFlowScore", 5.0);
    f.session.save(&mut f.board).await.unwrap();

    rx.changed().await.unwrap();
    let aggregate = rx.borrow().clone();
    assert_eq!(aggregate.review_count, 1);
    assert_eq!(aggregate.average("messageFlowScore"), 5.0);
    assert_eq!(f.board.aggregate(), aggregate);
    assert_eq!(f.board.progress().reviewed, 1);
}

#[tokio::test]
async fn save_failure_leaves_everything_in_place() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.gateway
        .fail_submit(GatewayError::Transport("connection refused".into()));
    let before: Vec<_> = f.board.artifacts().to_vec();

    f.session.open(f.board.artifacts()[1].clone());
    f.session.set_comment("good");
    f.session.set_score("messageFlowScore", 4.0);
    let draft = f.session.draft().cloned();

    let err = f.session.save(&mut f.board).await.unwrap_err();
    assert!(matches!(err, SessionError::SaveFailed { ref artifact_id, .. } if artifact_id == "a1"));
    assert!(err.to_string().contains("a1"));

    assert_eq!(f.session.phase(), SessionPhase::Editing);
    assert!(f.session.is_dirty());
    assert_eq!(f.session.draft().cloned(), draft);
    for (b, a) in before.iter().zip(f.board.artifacts()) {
        assert!(Arc::ptr_eq(b, a));
    }
    assert!(f.observer.notes().contains(&Note::Failed));

    // Retry after the backend recovers.
    f.gateway.clear_failures();
    let outcome = f.session.save(&mut f.board).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { .. }));
    assert!(f.observer.notes().contains(&Note::Saved("a1".into())));
}

#[tokio::test]
async fn read_only_save_is_skipped() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::ReadOnly, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());

    let outcome = f.session.save(&mut f.board).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Skipped));
    assert_eq!(f.gateway.submit_calls(), 0);
    assert_eq!(f.session.phase(), SessionPhase::Open);
    assert!(!f.board.artifacts()[1].reviewed);
}

#[tokio::test]
async fn save_when_closed_is_skipped() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    let outcome = f.session.save(&mut f.board).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Skipped));
    assert_eq!(f.gateway.submit_calls(), 0);
}

/// Backend whose review submissions never come back in time.
struct StalledSubmitGateway {
    inner: MemoryGateway,
}

#[async_trait]
impl ReviewGateway for StalledSubmitGateway {
    async fn fetch_review_data(
        &self,
        artifact_type: ArtifactType,
        project_id: &ProjectId,
    ) -> GatewayResult<ReviewData> {
        self.inner.fetch_review_data(artifact_type, project_id).await
    }

    async fn submit_review(&self, submission: &ReviewSubmission) -> GatewayResult<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        self.inner.submit_review(submission).await
    }

    async fn save_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()> {
        self.inner
            .save_general_comment(project_id, artifact_type, comment)
            .await
    }

    async fn fetch_rubric_evaluation(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
    ) -> GatewayResult<Option<RubricEvaluation>> {
        self.inner
            .fetch_rubric_evaluation(project_id, artifact_type)
            .await
    }

    async fn save_rubric_evaluation(
        &self,
        submission: &RubricEvaluationSubmission,
    ) -> GatewayResult<()> {
        self.inner.save_rubric_evaluation(submission).await
    }

    async fn save_rubric_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()> {
        self.inner
            .save_rubric_general_comment(project_id, artifact_type, comment)
            .await
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_save_leaves_the_session_editable() {
    let project = ProjectId::from("proj-1");
    let gateway = Arc::new(StalledSubmitGateway {
        inner: MemoryGateway::new().with_review_data(
            ArtifactType::SequenceDiagrams,
            &project,
            ReviewData {
                artifacts: sequence_diagrams(),
                ..Default::default()
            },
        ),
    });
    let mut board = ReviewBoard::load(
        gateway.clone(),
        ArtifactType::SequenceDiagrams,
        project,
        Capability::Admin,
    )
    .await
    .unwrap();
    let mut session = ReviewSession::for_board(&board);

    session.open(board.artifacts()[1].clone());
    session.set_score("messageFlowScore", 4.0);
    let draft = session.draft().cloned();

    let waited = tokio::time::timeout(Duration::from_millis(50), session.save(&mut board)).await;
    assert!(waited.is_err());

    assert_eq!(session.phase(), SessionPhase::Editing);
    assert!(session.is_dirty());
    assert_eq!(session.draft().cloned(), draft);
    assert!(!board.artifacts()[1].reviewed);

    session.set_score("messageFlowScore", 2.0);
    assert_eq!(
        session.draft().unwrap().scores.get("messageFlowScore"),
        Some(&2.0)
    );
    assert_eq!(session.request_close(), SessionPhase::UnsavedPrompt);
}

// ── Unsaved prompt ──

#[tokio::test]
async fn dirty_close_prompts_and_cancel_keeps_draft() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());
    f.session.set_comment("half written");

    assert_eq!(f.session.request_close(), SessionPhase::UnsavedPrompt);

    // Edits are frozen while prompting.
    f.session.set_comment("ignored");
    assert_eq!(f.session.draft().unwrap().comment, "half written");

    let phase = f
        .session
        .resolve_unsaved_prompt(PromptAction::Cancel, &mut f.board)
        .await
        .unwrap();
    assert_eq!(phase, SessionPhase::Editing);
    assert_eq!(f.session.draft().unwrap().comment, "half written");
    assert!(f.session.is_dirty());
}

#[tokio::test]
async fn discard_closes_and_reopen_uses_committed_values() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[1].clone());
    f.session.set_comment("throw away");
    f.session.set_score("completenessScore", 5.0);
    f.session.request_close();

    let phase = f
        .session
        .resolve_unsaved_prompt(PromptAction::Discard, &mut f.board)
        .await
        .unwrap();
    assert_eq!(phase, SessionPhase::Closed);
    assert_eq!(f.gateway.submit_calls(), 0);

    f.session.open(f.board.artifacts()[1].clone());
    let draft = f.session.draft().unwrap();
    assert_eq!(draft.comment, "");
    assert_eq!(draft.scores.get("completenessScore"), Some(&0.0));
}

#[tokio::test]
async fn prompt_save_commits() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[2].clone());
    f.session.set_score("umlCorrectnessScore", 3.0);
    f.session.request_close();

    let phase = f
        .session
        .resolve_unsaved_prompt(PromptAction::Save, &mut f.board)
        .await
        .unwrap();
    assert_eq!(phase, SessionPhase::Closed);
    assert!(f.board.artifacts()[2].reviewed);
    assert_eq!(f.board.artifacts()[2].rating, 1.0);
}

#[tokio::test]
async fn prompt_save_failure_returns_to_editing() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.gateway.fail_submit(GatewayError::Rejected {
        status: 500,
        message: "database unavailable".into(),
    });
    f.session.open(f.board.artifacts()[2].clone());
    f.session.set_score("umlCorrectnessScore", 3.0);
    f.session.request_close();

    let err = f
        .session
        .resolve_unsaved_prompt(PromptAction::Save, &mut f.board)
        .await
        .unwrap_err();
    assert!(matches!(err.gateway_error(), GatewayError::Rejected { status: 500, .. }));
    assert_eq!(f.session.phase(), SessionPhase::Editing);
}

#[tokio::test]
async fn resolve_outside_prompt_is_a_no_op() {
    let mut f = fixture(ArtifactType::SequenceDiagrams, Capability::Admin, sequence_diagrams()).await;
    f.session.open(f.board.artifacts()[0].clone());
    f.session.set_comment("x");

    let phase = f
        .session
        .resolve_unsaved_prompt(PromptAction::Discard, &mut f.board)
        .await
        .unwrap();
    assert_eq!(phase, SessionPhase::Editing);
    assert_eq!(f.session.draft().unwrap().comment, "x");
}

// ── One session serves every artifact type ──

#[tokio::test]
async fn every_artifact_type_saves_with_its_singular_name() {
    for artifact_type in ArtifactType::ALL {
        let mut f = fixture(artifact_type, Capability::Admin, vec![Artifact::new("x1")]).await;
        f.session.open(f.board.artifacts()[0].clone());
        let key = f.session.rubric().criteria[0].key;
        f.session.set_score(key, 5.0);

        f.session.save(&mut f.board).await.unwrap();

        let submission = &f.gateway.submissions()[0];
        assert_eq!(submission.artifact_type, artifact_type.singular());
        assert!(f.board.artifacts()[0].reviewed, "{artifact_type}");
    }
}
