//! Notification contract from the review core to its host.
//!
//! Hosts implement only the callbacks they care about; every method has a
//! no-op default. Callbacks run synchronously on the caller's task and must
//! not block.

use crate::domain::{AggregateRubric, Artifact, SessionError};
use crate::session::ReviewDraft;

pub trait ReviewObserver: Send + Sync {
    /// The dirty flag flipped.
    fn dirty_changed(&self, _dirty: bool) {}

    /// The draft changed (or a session opened), for live score displays.
    fn draft_changed(&self, _draft: &ReviewDraft) {}

    /// A review was committed; `artifact` is the replacement now on the board.
    fn save_succeeded(&self, _artifact: &Artifact) {}

    /// A save failed. The session is left exactly as it was.
    fn save_failed(&self, _error: &SessionError) {}

    /// The board's aggregate snapshot was replaced.
    fn aggregate_refreshed(&self, _aggregate: &AggregateRubric) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReviewObserver for NoopObserver {}
