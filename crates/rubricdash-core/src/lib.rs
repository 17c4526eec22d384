//! rubricdash core library
//!
//! Rubric model, score aggregation, the review session state machine and
//! project-level rubric evaluations, independent of any transport. The HTTP
//! backend lives in `rubricdash-client`.

pub mod auth;
pub mod board;
pub mod domain;
pub mod evaluation;
pub mod fakes;
pub mod gateway;
pub mod metrics;
pub mod obs;
pub mod observer;
pub mod rubric;
pub mod score;
pub mod session;
pub mod telemetry;

pub use auth::{AuthSession, BearerToken, Capability, CurrentUser, ADMIN_ROLE};
pub use board::{GeneralComment, ReviewBoard, ReviewProgress};
pub use domain::{
    AggregateRubric, Artifact, ArtifactId, ArtifactType, GatewayError, GatewayResult, ProjectId,
    Scores, SessionError,
};
pub use evaluation::{
    default_criteria, evaluation_score, EvaluationCriterion, EvaluationTracker, RubricEvaluation,
    RubricEvaluationSubmission,
};
pub use gateway::{ReviewData, ReviewGateway, ReviewSubmission, RESERVED_SUBMISSION_KEYS};
pub use metrics::METRICS;
pub use observer::{NoopObserver, ReviewObserver};
pub use rubric::{Applicability, CriterionDefinition, Rubric};
pub use score::{criteria_averages, overall_score, round_half};
pub use session::{PromptAction, ReviewDraft, ReviewSession, SaveOutcome, SessionPhase};
pub use telemetry::{init_tracing, LogFormat, LogSettings};

/// Crate version, for `--version` output and logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
