//! Phase timing results of connection tests

use crate::error::TestFailure;
use crate::types::PerformanceLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Latencies of one connection test, each relative to the test start.
///
/// Four phase latencies are reported, but only three of them are disjoint:
/// `first_roundtrip_latency` is a sub-span of `full_roundtrip_latency`.
/// `total_duration` is therefore the sum of the disjoint phases, connect +
/// full roundtrip + disconnect, and adding the first roundtrip as well would
/// count that span twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Connect + full roundtrip + disconnect
    pub total_duration: Duration,

    /// Time to establish the connection
    pub connect_latency: Duration,

    /// Time from connection established to the first matched echo.
    /// Includes the time it takes to send the message.
    pub first_roundtrip_latency: Duration,

    /// Time from connection established to the last matched echo.
    /// Includes the time it takes to send every message.
    pub full_roundtrip_latency: Duration,

    /// Time from the last matched echo to the close acknowledgment
    pub disconnect_latency: Duration,
}

impl TestResult {
    pub fn connect_ms(&self) -> f64 {
        self.connect_latency.as_secs_f64() * 1000.0
    }

    pub fn first_roundtrip_ms(&self) -> f64 {
        self.first_roundtrip_latency.as_secs_f64() * 1000.0
    }

    pub fn full_roundtrip_ms(&self) -> f64 {
        self.full_roundtrip_latency.as_secs_f64() * 1000.0
    }

    pub fn disconnect_ms(&self) -> f64 {
        self.disconnect_latency.as_secs_f64() * 1000.0
    }

    pub fn total_ms(&self) -> f64 {
        self.total_duration.as_secs_f64() * 1000.0
    }

    /// Sum of the three consecutive phases; the first roundtrip is already
    /// inside the full roundtrip
    pub fn phase_sum(&self) -> Duration {
        self.connect_latency + self.full_roundtrip_latency + self.disconnect_latency
    }

    /// Whether the phases are ordered and the total adds up
    pub fn is_consistent(&self) -> bool {
        self.first_roundtrip_latency <= self.full_roundtrip_latency
            && self.total_duration == self.phase_sum()
    }

    pub fn performance_level(&self) -> PerformanceLevel {
        PerformanceLevel::from_duration(self.full_roundtrip_latency)
    }
}

/// Records phase boundaries as a test progresses
#[derive(Debug, Clone, Copy)]
pub struct PhaseClock {
    started_at: Instant,
}

impl PhaseClock {
    pub fn start() -> Self {
        Self { started_at: Instant::now() }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Elapsed time since the test began
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// What a worker reports after each iteration
#[derive(Debug, Clone)]
pub struct IterationOutcome {
    /// Worker slot that ran the test
    pub worker_id: usize,
    /// 1-based iteration number within that worker
    pub iteration: u64,
    /// Result of the connection test
    pub outcome: std::result::Result<TestResult, TestFailure>,
    /// Wall-clock time the test finished
    pub finished_at: DateTime<Utc>,
}

impl IterationOutcome {
    pub fn new(
        worker_id: usize,
        iteration: u64,
        outcome: std::result::Result<TestResult, TestFailure>,
    ) -> Self {
        Self {
            worker_id,
            iteration,
            outcome,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Full-roundtrip latency of a successful iteration
    pub fn full_roundtrip(&self) -> Option<Duration> {
        self.outcome.as_ref().ok().map(|r| r.full_roundtrip_latency)
    }
}
