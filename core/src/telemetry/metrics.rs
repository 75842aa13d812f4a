use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frames_processed: usize,
    pub frames_dropped: usize,
    pub decode_errors: usize,
    pub commits: usize,
}

/// Counters for the frame pipeline, shared across the analysis and bridge
/// threads.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames_processed += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames_dropped += 1;
        }
    }

    pub fn record_decode_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.decode_errors += 1;
        }
    }

    pub fn record_commit(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.commits += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
