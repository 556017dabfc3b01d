use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline and search activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_published: AtomicU64,
    pages_completed: AtomicU64,
    pages_failed: AtomicU64,
    searches_served: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document reaching the published state.
    pub fn record_published(&self) {
        self.documents_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a page reaching terminal success.
    pub fn record_page_completed(&self) {
        self.pages_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a page reaching terminal failure.
    pub fn record_page_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a served search query.
    pub fn record_search(&self) {
        self.searches_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_published: self.documents_published.load(Ordering::Relaxed),
            pages_completed: self.pages_completed.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            searches_served: self.searches_served.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents that completed processing and were published.
    pub documents_published: u64,
    /// Pages that reached terminal success since startup.
    pub pages_completed: u64,
    /// Pages that reached terminal failure since startup.
    pub pages_failed: u64,
    /// Search queries served since startup.
    pub searches_served: u64,
}
