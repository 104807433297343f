//! Classified failures of a single connection test
//!
//! Every way a connection test can end unsuccessfully is a variant of
//! [`ConnectionTestError`]. The runner never panics; it hands one of these
//! back, wrapped in a [`TestFailure`] that also carries whatever latencies were
//! measured before the failure.

use crate::models::{PacketKind, TestResult};
use crate::types::ConnectionPhase;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Coarse classification used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The connection or a write broke
    Transport,
    /// The server echoed something other than what was sent
    Correctness,
    /// A bounded wait expired
    Liveness,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Transport => "transport",
            ErrorClass::Correctness => "correctness",
            ErrorClass::Liveness => "liveness",
        }
    }
}

/// Why a single connection test failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTestError {
    /// The connection could not be established
    #[error("dial failed: {0}")]
    Dial(String),

    /// Writing a scripted packet failed
    #[error("send failed at packet {index}: {reason}")]
    Send { index: usize, reason: String },

    /// Writing the normal-closure control message failed
    #[error("close send failed: {0}")]
    CloseSend(String),

    /// The server sent more messages than the script contains
    #[error("received more messages than expected ({expected} scripted)")]
    UnexpectedExtraMessage { expected: usize },

    /// An echo arrived with the wrong message type
    #[error("unexpected message type at packet {index}: expected {expected}, got {actual}")]
    TypeMismatch {
        index: usize,
        expected: PacketKind,
        actual: PacketKind,
    },

    /// An echo arrived with different payload bytes
    #[error("unexpected payload at packet {index}: expected {expected_len} bytes, got {actual_len} bytes")]
    PayloadMismatch {
        index: usize,
        expected_len: usize,
        actual_len: usize,
    },

    /// The server closed normally before every echo arrived
    #[error("connection closed after {received} of {expected} echoes")]
    ClosedEarly { received: usize, expected: usize },

    /// Reading failed, the close code was abnormal, or the stream ended
    #[error("receive failed: {0}")]
    Receive(String),

    /// Not every echo arrived within the receive bound
    #[error("receive timeout: not all packets were received within {0:?}")]
    ReceiveTimeout(Duration),

    /// The server did not acknowledge the closure within the close bound
    #[error("closure timeout after {0:?}")]
    CloseTimeout(Duration),
}

impl ConnectionTestError {
    /// Stable category name for logs and statistics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Dial(_) => "DIAL",
            Self::Send { .. } => "SEND",
            Self::CloseSend(_) => "CLOSE_SEND",
            Self::UnexpectedExtraMessage { .. } => "EXTRA_MESSAGE",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::PayloadMismatch { .. } => "PAYLOAD_MISMATCH",
            Self::ClosedEarly { .. } => "CLOSED_EARLY",
            Self::Receive(_) => "RECEIVE",
            Self::ReceiveTimeout(_) => "RECEIVE_TIMEOUT",
            Self::CloseTimeout(_) => "CLOSE_TIMEOUT",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Dial(_) | Self::Send { .. } | Self::CloseSend(_) | Self::Receive(_) => {
                ErrorClass::Transport
            }
            Self::UnexpectedExtraMessage { .. }
            | Self::TypeMismatch { .. }
            | Self::PayloadMismatch { .. }
            | Self::ClosedEarly { .. } => ErrorClass::Correctness,
            Self::ReceiveTimeout(_) | Self::CloseTimeout(_) => ErrorClass::Liveness,
        }
    }

    pub fn is_correctness_violation(&self) -> bool {
        self.class() == ErrorClass::Correctness
    }

    pub fn is_liveness_violation(&self) -> bool {
        self.class() == ErrorClass::Liveness
    }
}

/// A failed connection test together with its partial measurements.
///
/// The error is authoritative; `partial` only holds the latencies recorded
/// before the failure and must not be read as a complete result.
#[derive(Error, Debug, Clone)]
#[error("{error} (while {phase})")]
pub struct TestFailure {
    #[source]
    pub error: ConnectionTestError,
    pub phase: ConnectionPhase,
    pub partial: TestResult,
}

impl TestFailure {
    pub fn new(error: ConnectionTestError, phase: ConnectionPhase, partial: TestResult) -> Self {
        Self { error, phase, partial }
    }

    pub fn category(&self) -> &'static str {
        self.error.category()
    }
}
