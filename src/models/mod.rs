//! Data models and structures for the echo stress tester

pub mod config;
pub mod endpoint;
pub mod metrics;
pub mod script;

// Re-export main model types
pub use config::Config;
pub use endpoint::Endpoint;
pub use metrics::{IterationOutcome, PhaseClock, TestResult};
pub use script::{PacketKind, ScriptBuilder, TestPacket, TestScript};
