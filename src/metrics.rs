use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Thread-safe counters describing pipeline activity since process start.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_completed: AtomicU64,
    documents_failed: AtomicU64,
    fallback_summaries: AtomicU64,
    total_processing_millis: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that reached COMPLETED and how long the attempt took.
    pub fn record_completed(&self, elapsed: Duration) {
        self.documents_completed.fetch_add(1, Ordering::Relaxed);
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.total_processing_millis
            .fetch_add(millis, Ordering::Relaxed);
    }

    /// Record a document that reached FAILED.
    pub fn record_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a summary replaced by the canned fallback text.
    pub fn record_fallback_summary(&self) {
        self.fallback_summaries.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_completed: self.documents_completed.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            fallback_summaries: self.fallback_summaries.load(Ordering::Relaxed),
            total_processing_millis: self.total_processing_millis.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Attempts that finished with a stored summary.
    pub documents_completed: u64,
    /// Attempts that finished with a FAILED record.
    pub documents_failed: u64,
    /// Summaries substituted by the content-policy guard.
    pub fallback_summaries: u64,
    /// Wall-clock milliseconds spent across completed attempts.
    pub total_processing_millis: u64,
}
