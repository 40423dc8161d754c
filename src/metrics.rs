use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing webhook activity.
#[derive(Default)]
pub struct PipelineMetrics {
    requests_received: AtomicU64,
    requests_without_matches: AtomicU64,
    files_extracted: AtomicU64,
    answers_written: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming pipeline run.
    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run whose search returned no files.
    pub fn record_no_matches(&self) {
        self.requests_without_matches
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record one file passing through extraction (including unsupported formats).
    pub fn record_extraction(&self) {
        self.files_extracted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful write to the notes service.
    pub fn record_answer(&self) {
        self.answers_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            requests_without_matches: self.requests_without_matches.load(Ordering::Relaxed),
            files_extracted: self.files_extracted.load(Ordering::Relaxed),
            answers_written: self.answers_written.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Pipeline runs started since startup.
    pub requests_received: u64,
    /// Runs that ended because the search matched nothing.
    pub requests_without_matches: u64,
    /// Files dispatched to extraction.
    pub files_extracted: u64,
    /// Records written to the notes service.
    pub answers_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_requests_and_extractions() {
        let metrics = PipelineMetrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_no_matches();
        metrics.record_extraction();
        metrics.record_extraction();
        metrics.record_extraction();
        metrics.record_answer();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_received, 2);
        assert_eq!(snapshot.requests_without_matches, 1);
        assert_eq!(snapshot.files_extracted, 3);
        assert_eq!(snapshot.answers_written, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
