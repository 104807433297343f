//! Type definitions and aliases

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Lifecycle phase of a single connection test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionPhase {
    /// Establishing the connection
    Dialing,
    /// Writing the script while the receiver verifies echoes
    Streaming,
    /// All packets written, waiting for the remaining echoes
    AwaitingEchoes,
    /// Close sent, waiting for the acknowledgment
    Closing,
    /// Close handshake completed
    Closed,
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionPhase::Dialing => "dialing",
            ConnectionPhase::Streaming => "streaming",
            ConnectionPhase::AwaitingEchoes => "awaiting echoes",
            ConnectionPhase::Closing => "closing",
            ConnectionPhase::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round-trip performance classification used for colored output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    /// Full round trip under 50ms
    Excellent,
    /// 50-200ms
    Good,
    /// 200ms-1s
    Fair,
    /// Over 1 second
    Poor,
}

impl PerformanceLevel {
    /// Classify a full-roundtrip latency
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_millis(duration.as_secs_f64() * 1000.0)
    }

    /// Classify a latency given in milliseconds
    pub fn from_millis(ms: f64) -> Self {
        if ms < 50.0 {
            Self::Excellent
        } else if ms < 200.0 {
            Self::Good
        } else if ms < 1000.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}
