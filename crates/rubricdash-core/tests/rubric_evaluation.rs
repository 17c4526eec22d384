//! Integration tests for project-level rubric evaluations.

use std::sync::Arc;

use rubricdash_core::fakes::MemoryGateway;
use rubricdash_core::{
    default_criteria, ArtifactType, AuthSession, BearerToken, CurrentUser,
    EvaluationCriterion, EvaluationTracker, GatewayError, ProjectId, RubricEvaluation,
    SessionError,
};

fn auth(role: &str) -> AuthSession {
    AuthSession::new(
        BearerToken::new("t"),
        CurrentUser {
            id: "u-prof".into(),
            email: "prof@example.edu".into(),
            username: Some("Prof".into()),
            role: role.into(),
        },
    )
}

fn stored_mockups() -> RubricEvaluation {
    RubricEvaluation {
        criteria: vec![
            EvaluationCriterion {
                score: 4.0,
                ..EvaluationCriterion::new("Flow", "Logical flow between screens")
            },
            EvaluationCriterion {
                score: 2.0,
                comment: Some("buttons differ per screen".into()),
                ..EvaluationCriterion::new("Consistency", "")
            },
        ],
        general_comment: "Solid first pass".into(),
    }
}

async fn tracker(
    gateway: &Arc<MemoryGateway>,
    artifact_type: ArtifactType,
    role: &str,
) -> EvaluationTracker {
    EvaluationTracker::load(
        gateway.clone(),
        ProjectId::from("p1"),
        artifact_type,
        &auth(role),
    )
    .await
    .unwrap()
}

// ── Load ──

#[tokio::test]
async fn missing_evaluation_starts_from_zeroed_defaults() {
    let gateway = Arc::new(MemoryGateway::new());
    let t = tracker(&gateway, ArtifactType::Stories, "Admin").await;

    assert!(!t.is_stored());
    assert!(!t.is_dirty());
    assert_eq!(t.criteria(), default_criteria(ArtifactType::Stories).as_slice());
    assert_eq!(t.overall_score(), 0.0);
    assert_eq!(t.general_comment().saved(), "");
}

#[tokio::test]
async fn empty_stored_criteria_also_use_defaults() {
    let project = ProjectId::from("p1");
    let gateway = Arc::new(MemoryGateway::new().with_evaluation(
        ArtifactType::DesignPatterns,
        &project,
        RubricEvaluation {
            criteria: vec![],
            general_comment: "kept".into(),
        },
    ));
    let t = tracker(&gateway, ArtifactType::DesignPatterns, "Admin").await;

    assert!(!t.is_stored());
    assert_eq!(t.criteria().len(), 5);
    assert_eq!(t.general_comment().saved(), "kept");
}

#[tokio::test]
async fn stored_evaluation_is_used_as_is() {
    let project = ProjectId::from("p1");
    let gateway = Arc::new(MemoryGateway::new().with_evaluation(
        ArtifactType::Mockups,
        &project,
        stored_mockups(),
    ));
    let t = tracker(&gateway, ArtifactType::Mockups, "Student").await;

    assert!(t.is_stored());
    assert_eq!(t.criteria().len(), 2);
    assert_eq!(t.overall_score(), 3.0);
    assert_eq!(
        t.criterion("consistency").and_then(|c| c.comment.as_deref()),
        Some("buttons differ per screen")
    );
}

#[tokio::test]
async fn load_failure_is_reported() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.fail_fetch(GatewayError::Unauthorized);

    let result = EvaluationTracker::load(
        gateway.clone(),
        ProjectId::from("p1"),
        ArtifactType::Stories,
        &auth("Admin"),
    )
    .await;
    assert!(matches!(result, Err(SessionError::LoadFailed(GatewayError::Unauthorized))));
}

// ── Edit and save ──

#[tokio::test]
async fn edits_dirty_and_save_moves_the_baseline() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut t = tracker(&gateway, ArtifactType::Stories, "Admin").await;

    assert!(t.set_score("user focus", 4.0));
    assert!(t.set_comment("Independence", "stories depend on login"));
    assert!(!t.set_score("Not A Criterion", 5.0));
    assert!(t.is_dirty());
    assert_eq!(t.overall_score(), 0.8);

    assert!(t.save().await.unwrap());
    assert!(!t.is_dirty());
    assert!(t.is_stored());

    let submission = &gateway.evaluation_submissions()[0];
    assert_eq!(submission.rubric_type, ArtifactType::Stories);
    assert_eq!(submission.project, ProjectId::from("p1"));
    assert_eq!(submission.evaluator, "u-prof");
    assert_eq!(submission.criteria[0].score, 4.0);

    let stored = gateway
        .evaluation(ArtifactType::Stories, &ProjectId::from("p1"))
        .unwrap();
    assert_eq!(stored.criteria, t.criteria());
}

#[tokio::test]
async fn reverting_an_edit_is_clean_again() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut t = tracker(&gateway, ArtifactType::Mockups, "Admin").await;

    t.set_score("Flow", 3.0);
    assert!(t.is_dirty());
    t.set_score("Flow", 0.0);
    assert!(!t.is_dirty());

    t.set_comment("Flow", "x");
    t.set_comment("Flow", "");
    assert!(!t.is_dirty());
}

#[tokio::test]
async fn save_failure_keeps_edits_and_baseline() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.fail_evaluation(GatewayError::Transport("offline".into()));
    let mut t = tracker(&gateway, ArtifactType::Stories, "Admin").await;

    t.set_score("Size/Scope", 5.0);
    let err = t.save().await.unwrap_err();
    assert!(matches!(err, SessionError::EvaluationFailed(_)));
    assert!(t.is_dirty());
    assert!(!t.is_stored());
    assert_eq!(t.criterion("Size/Scope").unwrap().score, 5.0);

    gateway.clear_failures();
    assert!(t.save().await.unwrap());
    assert!(!t.is_dirty());
}

#[tokio::test]
async fn read_only_callers_cannot_edit_or_save() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut t = tracker(&gateway, ArtifactType::Stories, "Student").await;

    assert!(!t.set_score("User Focus", 5.0));
    t.set_general_comment("nope");
    assert!(!t.is_dirty());
    assert!(!t.general_comment().is_dirty());
    assert!(!t.save().await.unwrap());
    t.save_general_comment().await.unwrap();
    assert!(gateway.evaluation_submissions().is_empty());
    assert!(gateway
        .evaluation(ArtifactType::Stories, &ProjectId::from("p1"))
        .is_none());
}

// ── General comment ──

#[tokio::test]
async fn general_comment_saves_separately_from_criteria() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut t = tracker(&gateway, ArtifactType::DesignPatterns, "Admin").await;

    t.set_general_comment("Good use of Strategy");
    assert!(t.general_comment().is_dirty());
    t.save_general_comment().await.unwrap();

    assert!(!t.general_comment().is_dirty());
    assert!(gateway.evaluation_submissions().is_empty());
    let stored = gateway
        .evaluation(ArtifactType::DesignPatterns, &ProjectId::from("p1"))
        .unwrap();
    assert_eq!(stored.general_comment, "Good use of Strategy");
    assert!(stored.criteria.is_empty());
}

#[tokio::test]
async fn general_comment_failure_keeps_baseline() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.fail_evaluation(GatewayError::Rejected {
        status: 500,
        message: "db down".into(),
    });
    let mut t = tracker(&gateway, ArtifactType::Mockups, "Admin").await;

    t.set_general_comment("edited");
    let err = t.save_general_comment().await.unwrap_err();
    assert!(matches!(err, SessionError::GeneralCommentFailed(_)));
    assert_eq!(t.general_comment().saved(), "");
    assert_eq!(t.general_comment().current(), "edited");
}
