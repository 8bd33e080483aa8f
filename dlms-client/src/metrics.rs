//! Communication counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters shared by every `communicate` task
#[derive(Debug, Default)]
pub struct CommunicationMetrics {
    success: AtomicU64,
    failure: AtomicU64,
    rejected: AtomicU64,
    total_duration_ms: AtomicU64,
    last_duration_ms: AtomicU64,
}

/// Point-in-time copy of [`CommunicationMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub success: u64,
    pub failure: u64,
    /// Calls refused by an open circuit breaker, also counted as failures
    pub rejected: u64,
    pub total_duration_ms: u64,
    pub last_duration_ms: u64,
}

impl MetricsSnapshot {
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }

    pub fn average_duration(&self) -> Option<Duration> {
        match self.total() {
            0 => None,
            n => Some(Duration::from_millis(self.total_duration_ms / n)),
        }
    }
}

impl CommunicationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, duration: Duration) {
        self.success.fetch_add(1, Ordering::Relaxed);
        self.record_duration(duration);
    }

    pub fn record_failure(&self, duration: Duration) {
        self.failure.fetch_add(1, Ordering::Relaxed);
        self.record_duration(duration);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duration(&self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        self.total_duration_ms.fetch_add(millis, Ordering::Relaxed);
        self.last_duration_ms.store(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            success: self.success.load(Ordering::Relaxed),
            failure: self.failure.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            total_duration_ms: self.total_duration_ms.load(Ordering::Relaxed),
            last_duration_ms: self.last_duration_ms.load(Ordering::Relaxed),
        }
    }
}
