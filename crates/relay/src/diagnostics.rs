//! In-memory delivery diagnostics: a bounded ring of recent attempts plus
//! running aggregate counters. Owned and injected by the caller; nothing
//! here is process-global, and nothing survives a restart.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

/// Which configured endpoint a dispatch targeted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Lead,
    Order,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Order => "order",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    Initial,
    Retry,
}

/// One POST, success or failure, as it was observed.
#[derive(Clone, Debug, Serialize)]
pub struct AttemptRecord {
    pub request_id: String,
    pub endpoint: EndpointKind,
    pub event_type: String,
    pub phase: AttemptPhase,
    /// HTTP status when a response arrived; `None` for network errors and
    /// timeouts.
    pub status: Option<u16>,
    pub success: bool,
    pub elapsed_ms: u64,
    pub payload_bytes: usize,
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate transmission counters since process start.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RelayStats {
    pub total_attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_successes: u64,
    pub consecutive_failures: u64,
    pub average_response_ms: f64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    recent: VecDeque<AttemptRecord>,
    stats: RelayStats,
}

/// Bounded attempt log. Cheap to clone; clones share the same buffer.
#[derive(Clone, Debug)]
pub struct DiagnosticsLog {
    capacity: usize,
    inner: Arc<Mutex<Inner>>,
}

impl DiagnosticsLog {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), inner: Arc::new(Mutex::new(Inner::default())) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn record(&self, record: AttemptRecord) {
        let mut guard = self.inner.lock().await;

        let stats = &mut guard.stats;
        stats.total_attempts += 1;
        stats.average_response_ms = (stats.average_response_ms
            * (stats.total_attempts - 1) as f64
            + record.elapsed_ms as f64)
            / stats.total_attempts as f64;
        if record.success {
            stats.successes += 1;
            stats.consecutive_successes += 1;
            stats.consecutive_failures = 0;
            stats.last_success_at = Some(record.recorded_at);
        } else {
            stats.failures += 1;
            stats.consecutive_failures += 1;
            stats.consecutive_successes = 0;
            stats.last_failure_at = Some(record.recorded_at);
        }

        guard.recent.push_back(record);
        while guard.recent.len() > self.capacity {
            guard.recent.pop_front();
        }
    }

    /// Recent attempts, newest first.
    pub async fn recent(&self) -> Vec<AttemptRecord> {
        let guard = self.inner.lock().await;
        guard.recent.iter().rev().cloned().collect()
    }

    pub async fn stats(&self) -> RelayStats {
        let guard = self.inner.lock().await;
        guard.stats.clone()
    }

    /// Fraction of attempts that succeeded, or `None` before any attempt.
    pub async fn success_rate(&self) -> Option<f64> {
        let guard = self.inner.lock().await;
        let stats = &guard.stats;
        (stats.total_attempts > 0).then(|| stats.successes as f64 / stats.total_attempts as f64)
    }
}
