//! Per-invocation lifecycle state of a connection test

use crate::{
    error::{ConnectionTestError, TestFailure},
    models::{PhaseClock, TestResult},
    types::ConnectionPhase,
};
use std::time::Duration;

/// When the test began and which phase is active.
///
/// Owned by the runner for the duration of one test and dropped afterwards.
/// The expected echo index is not here: only the receiver task advances it.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionState {
    clock: PhaseClock,
    phase: ConnectionPhase,
}

impl ConnectionState {
    /// Start the clock in the dialing phase
    pub fn begin() -> Self {
        Self {
            clock: PhaseClock::start(),
            phase: ConnectionPhase::Dialing,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn clock(&self) -> PhaseClock {
        self.clock
    }

    /// Time since the test began
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn enter(&mut self, phase: ConnectionPhase) {
        self.phase = phase;
    }

    /// Build a failure tagged with the current phase
    pub fn fail(&self, error: ConnectionTestError, partial: TestResult) -> TestFailure {
        TestFailure::new(error, self.phase, partial)
    }
}
