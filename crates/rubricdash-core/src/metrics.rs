//! Global atomic counters for review activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single `tracing::info!`
//! event (e.g. when a CLI command finishes).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    sessions_opened: AtomicU64,
    reviews_submitted: AtomicU64,
    save_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            sessions_opened: AtomicU64::new(0),
            reviews_submitted: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_sessions_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "sessions_opened", "counter incremented");
    }

    pub fn inc_reviews_submitted(&self) {
        self.reviews_submitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "reviews_submitted", "counter incremented");
    }

    pub fn inc_save_failures(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "save_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            sessions_opened = self.sessions_opened(),
            reviews_submitted = self.reviews_submitted(),
            save_failures = self.save_failures(),
        );
    }

    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.load(Ordering::Relaxed)
    }

    pub fn reviews_submitted(&self) -> u64 {
        self.reviews_submitted.load(Ordering::Relaxed)
    }

    pub fn save_failures(&self) -> u64 {
        self.save_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.sessions_opened.store(0, Ordering::Relaxed);
        self.reviews_submitted.store(0, Ordering::Relaxed);
        self.save_failures.store(0, Ordering::Relaxed);
    }
}
