//! Review session controller.
//!
//! A [`ReviewSession`] owns the artifact currently under review, an editable
//! [`ReviewDraft`] and a separate baseline copy used only for dirty
//! comparison. One session serves every artifact type; the type only selects
//! the rubric.
//!
//! ```text
//! Closed ──open──▶ Open ──edit──▶ Editing ──save──▶ Saving ──ok──▶ Closed
//!                   ▲  ◀─revert──    │  ▲                 └─err──▶ Editing
//!                   │                │  └──cancel──┐
//!                   └─request_close──┼─────▶ UnsavedPrompt ──discard──▶ Closed
//!                     (clean)        └─(dirty)──┘      └──save──▶ Saving
//! ```
//!
//! Read-only callers may open a session; edits and saves are then silent
//! no-ops. Sessions are mutated through `&mut self`, so a session cannot have
//! two saves in flight at once. A save whose future is dropped before the
//! backend answers leaves the session editable with its draft intact.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::Capability;
use crate::board::ReviewBoard;
use crate::domain::{Artifact, ArtifactType, Scores, SessionError};
use crate::gateway::{ReviewGateway, ReviewSubmission};
use crate::metrics::METRICS;
use crate::obs::{self, SessionSpan};
use crate::observer::{NoopObserver, ReviewObserver};
use crate::rubric::Rubric;
use crate::score::overall_score;

/// Observable phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Closed,
    /// Open with a draft equal to the baseline.
    Open,
    /// Open with unsaved changes.
    Editing,
    Saving,
    /// Close was requested with unsaved changes; waiting for a [`PromptAction`].
    UnsavedPrompt,
}

/// Resolution of the unsaved-changes prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Save,
    Discard,
    Cancel,
}

/// Editable review state. Always an independent copy of the artifact's
/// committed comment and scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewDraft {
    pub comment: String,
    pub scores: Scores,
}

impl ReviewDraft {
    /// Value-equality difference; a score missing on one side counts as 0.
    fn differs_from(&self, other: &ReviewDraft) -> bool {
        if self.comment != other.comment {
            return true;
        }
        let score = |d: &ReviewDraft, k: &str| d.scores.get(k).copied().unwrap_or(0.0);
        self.scores
            .keys()
            .chain(other.scores.keys())
            .any(|k| score(self, k) != score(other, k))
    }
}

/// Result of a [`ReviewSession::save`] call.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The review was committed and the artifact replaced on the board.
    /// `refresh` is the background aggregate refresh; awaiting it is optional.
    Saved {
        artifact: Arc<Artifact>,
        refresh: JoinHandle<()>,
    },
    /// Nothing to do: no session open, or the caller cannot edit.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Active,
    Saving,
    Prompt,
}

/// Holds a session in [`Stage::Saving`] while a submit is in flight.
///
/// Dropping it returns the session to [`Stage::Active`], which also covers a
/// caller abandoning the `save` future mid-await.
struct SavingStage<'a> {
    stage: &'a mut Stage,
}

impl<'a> SavingStage<'a> {
    fn enter(stage: &'a mut Stage) -> Self {
        *stage = Stage::Saving;
        Self { stage }
    }
}

impl Drop for SavingStage<'_> {
    fn drop(&mut self) {
        *self.stage = Stage::Active;
    }
}

#[derive(Debug)]
struct OpenReview {
    session_id: Uuid,
    artifact: Arc<Artifact>,
    baseline: ReviewDraft,
    draft: ReviewDraft,
    dirty: bool,
    stage: Stage,
}

pub struct ReviewSession {
    gateway: Arc<dyn ReviewGateway>,
    observer: Arc<dyn ReviewObserver>,
    rubric: Rubric,
    capability: Capability,
    current: Option<OpenReview>,
}

impl ReviewSession {
    pub fn new(
        gateway: Arc<dyn ReviewGateway>,
        artifact_type: ArtifactType,
        capability: Capability,
    ) -> Self {
        Self {
            gateway,
            observer: Arc::new(NoopObserver),
            rubric: Rubric::for_type(artifact_type),
            capability,
            current: None,
        }
    }

    /// A session sharing the board's gateway, artifact type and capability.
    pub fn for_board(board: &ReviewBoard) -> Self {
        Self::new(
            Arc::clone(board.gateway()),
            board.artifact_type(),
            board.capability(),
        )
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReviewObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.current {
            None => SessionPhase::Closed,
            Some(open) => match open.stage {
                Stage::Saving => SessionPhase::Saving,
                Stage::Prompt => SessionPhase::UnsavedPrompt,
                Stage::Active if open.dirty => SessionPhase::Editing,
                Stage::Active => SessionPhase::Open,
            },
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.current.as_ref().is_some_and(|o| o.dirty)
    }

    /// The artifact under review, as committed.
    pub fn artifact(&self) -> Option<&Arc<Artifact>> {
        self.current.as_ref().map(|o| &o.artifact)
    }

    pub fn draft(&self) -> Option<&ReviewDraft> {
        self.current.as_ref().map(|o| &o.draft)
    }

    /// Overall score of the draft over the artifact's applicable criteria.
    pub fn live_overall_score(&self) -> f64 {
        match &self.current {
            Some(open) => {
                let keys = self.rubric.applicable_keys(&open.artifact);
                overall_score(&open.draft.scores, Some(&keys))
            }
            None => 0.0,
        }
    }

    /// Open a session on `artifact`.
    ///
    /// Any session already open is dropped without saving; hosts resolve
    /// unsaved changes before switching artifacts.
    pub fn open(&mut self, artifact: impl Into<Arc<Artifact>>) {
        let artifact = artifact.into();

        if let Some(previous) = self.current.take() {
            if previous.dirty {
                tracing::warn!(
                    artifact_id = %previous.artifact.id,
                    "dropping unsaved draft to open another artifact"
                );
                self.observer.dirty_changed(false);
            }
            obs::emit_session_closed(&previous.artifact.id, false);
        }

        let mut scores = artifact.scores.clone();
        for key in self.rubric.applicable_keys(&artifact) {
            scores.entry(key.to_string()).or_insert(0.0);
        }
        let draft = ReviewDraft {
            comment: artifact.comment.clone(),
            scores,
        };

        let session_id = Uuid::new_v4();
        let _span = SessionSpan::enter(session_id, &artifact.id);
        METRICS.inc_sessions_opened();
        obs::emit_session_opened(
            self.rubric.artifact_type,
            &artifact.id,
            self.capability.can_edit(),
        );
        self.observer.draft_changed(&draft);

        self.current = Some(OpenReview {
            session_id,
            artifact,
            baseline: draft.clone(),
            draft,
            dirty: false,
            stage: Stage::Active,
        });
    }

    /// Set one criterion score. The value is stored as given.
    pub fn set_score(&mut self, key: &str, value: f64) {
        self.mutate(|draft| draft.scores.insert(key.to_string(), value) != Some(value));
    }

    pub fn set_comment(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.mutate(|draft| {
            if draft.comment == text {
                return false;
            }
            draft.comment = text;
            true
        });
    }

    /// Apply `edit` to the draft. `edit` reports whether it changed anything;
    /// observers hear about real changes only.
    fn mutate(&mut self, edit: impl FnOnce(&mut ReviewDraft) -> bool) {
        if !self.capability.can_edit() {
            tracing::debug!("edit ignored: read-only session");
            return;
        }
        let Some(open) = self.current.as_mut() else {
            tracing::debug!("edit ignored: no session open");
            return;
        };
        if open.stage != Stage::Active {
            tracing::debug!(stage = ?open.stage, "edit ignored: session not editable");
            return;
        }

        let _span = SessionSpan::enter(open.session_id, &open.artifact.id);
        if !edit(&mut open.draft) {
            return;
        }
        let dirty = open.draft.differs_from(&open.baseline);
        self.observer.draft_changed(&open.draft);
        if dirty != open.dirty {
            open.dirty = dirty;
            tracing::debug!(dirty, "dirty state changed");
            self.observer.dirty_changed(dirty);
        }
    }

    /// Ask to close the session.
    ///
    /// Closes immediately when there is nothing to lose (clean draft, or a
    /// read-only caller). Otherwise moves to [`SessionPhase::UnsavedPrompt`].
    pub fn request_close(&mut self) -> SessionPhase {
        let Some(open) = self.current.as_mut() else {
            return SessionPhase::Closed;
        };
        if open.stage != Stage::Active {
            return self.phase();
        }

        if open.dirty && self.capability.can_edit() {
            open.stage = Stage::Prompt;
        } else {
            self.close(false);
        }
        self.phase()
    }

    /// Resolve the unsaved-changes prompt. No-op outside that phase.
    pub async fn resolve_unsaved_prompt(
        &mut self,
        action: PromptAction,
        board: &mut ReviewBoard,
    ) -> Result<SessionPhase, SessionError> {
        let Some(open) = self.current.as_mut() else {
            return Ok(SessionPhase::Closed);
        };
        if open.stage != Stage::Prompt {
            return Ok(self.phase());
        }

        match action {
            PromptAction::Cancel => {
                open.stage = Stage::Active;
            }
            PromptAction::Discard => {
                self.close(false);
            }
            PromptAction::Save => {
                open.stage = Stage::Active;
                self.save(board).await?;
            }
        }
        Ok(self.phase())
    }

    /// Commit the draft.
    ///
    /// On success the artifact is replaced on `board`, the session closes and
    /// an aggregate refresh starts in the background. On failure nothing
    /// changes: the draft, dirty flag and board are exactly as before.
    pub async fn save(&mut self, board: &mut ReviewBoard) -> Result<SaveOutcome, SessionError> {
        if !self.capability.can_edit() {
            tracing::debug!("save ignored: read-only session");
            return Ok(SaveOutcome::Skipped);
        }
        let Some(open) = self.current.as_mut() else {
            tracing::debug!("save ignored: no session open");
            return Ok(SaveOutcome::Skipped);
        };

        let applicable = self.rubric.applicable_keys(&open.artifact);
        let rating = overall_score(&open.draft.scores, Some(&applicable));
        let submission = ReviewSubmission::new(
            self.rubric.artifact_type,
            open.artifact.id.clone(),
            rating,
            open.draft.comment.clone(),
            open.draft.scores.clone(),
        );

        let span = tracing::info_span!(
            "rubricdash.session.save",
            session_id = %open.session_id,
            artifact_id = %open.artifact.id,
        );
        let saving = SavingStage::enter(&mut open.stage);
        let result = self
            .gateway
            .submit_review(&submission)
            .instrument(span)
            .await;
        drop(saving);

        if let Err(source) = result {
            METRICS.inc_save_failures();
            obs::emit_review_save_failed(&open.artifact.id, &source);
            let err = SessionError::SaveFailed {
                artifact_id: open.artifact.id.to_string(),
                source,
            };
            self.observer.save_failed(&err);
            return Err(err);
        }

        let mut committed = Artifact::clone(&open.artifact);
        committed.rating = rating;
        committed.comment = submission.comment;
        committed.scores = submission.scores;
        committed.reviewed = true;
        let committed = Arc::new(committed);

        board.replace_by_id(Arc::clone(&committed));
        METRICS.inc_reviews_submitted();
        obs::emit_review_submitted(self.rubric.artifact_type, &committed.id, rating);

        self.close(true);
        let refresh = board.spawn_aggregate_refresh();
        self.observer.save_succeeded(&committed);

        Ok(SaveOutcome::Saved {
            artifact: committed,
            refresh,
        })
    }

    fn close(&mut self, committed: bool) {
        if let Some(open) = self.current.take() {
            if open.dirty {
                self.observer.dirty_changed(false);
            }
            obs::emit_session_closed(&open.artifact.id, committed);
        }
    }
}
