//! WebSocket Echo Stress Tester
//!
//! A load tester for WebSocket echo services. Many concurrent workers each
//! run a scripted exchange of text and binary messages, verify that every
//! message comes back unmodified and in order, and record latency for each
//! phase of the connection lifecycle.

pub mod app;
pub mod cli;
pub mod config;
pub mod client;
pub mod error;
pub mod logging;
pub mod stats;
pub mod executor;
pub mod output;
pub mod models;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ConnectionTestError, Result, TestFailure};
pub use models::{Config, Endpoint, IterationOutcome, PacketKind, TestPacket, TestResult, TestScript};
pub use client::{ConnectionTestRunner, RunnerConfig};
pub use executor::{ConnectionTest, DriverConfig, DriverReport, LoadDriver, WorkerSummary};
pub use stats::{LatencyStatistics, StatsCollector};
pub use output::{OutputFormatter, ColoredFormatter, PlainFormatter, OutputFormatterFactory};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata from build.rs
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TARGET_ADDR: &str = "localhost:8090";
    pub const DEFAULT_TARGET_PATH: &str = "/";
    pub const DEFAULT_SCHEME: &str = "ws";
    pub const DEFAULT_CONCURRENCY: usize = 200;
    /// Applies to dial, each send, the echo wait and the close wait
    pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_millis(100);
    pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(3);
    pub const DEFAULT_PAYLOAD_SIZE: usize = 4096;
    pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    /// Latency samples kept per phase for percentile reporting
    pub const DEFAULT_SAMPLE_CAPACITY: usize = 10_000;
}
