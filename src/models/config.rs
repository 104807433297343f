//! Configuration data model and validation

use crate::client::RunnerConfig;
use crate::executor::DriverConfig;
use crate::logging::LogFormat;
use crate::models::{Endpoint, TestScript};
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on worker count
pub const MAX_CONCURRENCY: usize = 10_000;
/// Upper bound on any single timeout, in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 300_000;
/// Upper bound on pacing delays, in milliseconds
pub const MAX_DELAY_MS: u64 = 600_000;
/// Upper bound on the random payload size
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server address as host:port
    #[serde(default = "default_target_addr")]
    pub target_addr: String,

    /// Request path on the server
    #[serde(default = "default_target_path")]
    pub target_path: String,

    /// ws or wss
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Dial bound in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Per-write bound in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Bound on waiting for every echo, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub receive_timeout_ms: u64,

    /// Bound on waiting for the close acknowledgment, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub close_timeout_ms: u64,

    /// Pause after a successful iteration, in milliseconds
    #[serde(default = "default_success_delay_ms")]
    pub success_delay_ms: u64,

    /// Pause after a failed iteration, in milliseconds
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,

    /// Size of the random binary packet in the standard script
    #[serde(default = "default_payload_size")]
    pub payload_size: usize,

    /// Stop each worker after this many iterations
    #[serde(default)]
    pub iterations: Option<u64>,

    /// Stop the whole run after this many seconds
    #[serde(default)]
    pub duration_secs: Option<u64>,

    /// Seconds between summary reports; 0 disables them
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,

    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Only log warnings and errors
    #[serde(default)]
    pub quiet: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_addr: default_target_addr(),
            target_path: default_target_path(),
            scheme: default_scheme(),
            concurrency: default_concurrency(),
            connect_timeout_ms: default_timeout_ms(),
            send_timeout_ms: default_timeout_ms(),
            receive_timeout_ms: default_timeout_ms(),
            close_timeout_ms: default_timeout_ms(),
            success_delay_ms: default_success_delay_ms(),
            failure_delay_ms: default_failure_delay_ms(),
            payload_size: default_payload_size(),
            iterations: None,
            duration_secs: None,
            report_interval_secs: default_report_interval_secs(),
            log_format: LogFormat::default(),
            enable_color: default_enable_color(),
            quiet: false,
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return the first hard error
    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;

        if self.concurrency == 0 {
            return Err(AppError::config("Concurrency must be greater than 0"));
        }

        if self.concurrency > MAX_CONCURRENCY {
            return Err(AppError::config(format!("Concurrency cannot exceed {}", MAX_CONCURRENCY)));
        }

        for (name, value) in [
            ("Connect timeout", self.connect_timeout_ms),
            ("Send timeout", self.send_timeout_ms),
            ("Receive timeout", self.receive_timeout_ms),
            ("Close timeout", self.close_timeout_ms),
        ] {
            if value == 0 {
                return Err(AppError::config(format!("{} must be greater than 0", name)));
            }
            if value > MAX_TIMEOUT_MS {
                return Err(AppError::config(format!("{} cannot exceed {}ms", name, MAX_TIMEOUT_MS)));
            }
        }

        for (name, value) in [
            ("Success delay", self.success_delay_ms),
            ("Failure delay", self.failure_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(AppError::config(format!("{} cannot exceed {}ms", name, MAX_DELAY_MS)));
            }
        }

        if self.payload_size > MAX_PAYLOAD_SIZE {
            return Err(AppError::config(format!("Payload size cannot exceed {} bytes", MAX_PAYLOAD_SIZE)));
        }

        if self.iterations == Some(0) {
            return Err(AppError::config("Iterations must be greater than 0"));
        }

        if self.duration_secs == Some(0) {
            return Err(AppError::config("Duration must be greater than 0"));
        }

        if self.quiet && (self.verbose || self.debug) {
            return Err(AppError::config("--quiet cannot be combined with --verbose or --debug"));
        }

        Ok(())
    }

    /// Endpoint composed from scheme, address and path
    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::new(&self.scheme, &self.target_addr, &self.target_path)
    }

    /// The standard script with this configuration's random payload size
    pub fn script(&self) -> TestScript {
        TestScript::standard(self.payload_size)
    }

    /// Timeouts for a single connection test
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            receive_timeout: Duration::from_millis(self.receive_timeout_ms),
            close_timeout: Duration::from_millis(self.close_timeout_ms),
        }
    }

    /// Worker pool and pacing settings
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            concurrency: self.concurrency,
            success_delay: Duration::from_millis(self.success_delay_ms),
            failure_delay: Duration::from_millis(self.failure_delay_ms),
            max_iterations: self.iterations,
        }
    }

    /// Overall run time limit
    pub fn run_duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    /// Interval between summary reports
    pub fn report_interval(&self) -> Option<Duration> {
        match self.report_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("STRESS_ADDR") {
            self.target_addr = addr.trim().to_string();
        }

        if let Ok(path) = std::env::var("STRESS_PATH") {
            self.target_path = path.trim().to_string();
        }

        if let Ok(scheme) = std::env::var("STRESS_SCHEME") {
            self.scheme = scheme.trim().to_lowercase();
        }

        if let Some(value) = env_number("STRESS_CONCURRENCY")? {
            self.concurrency = value as usize;
        }

        if let Some(value) = env_number("STRESS_CONNECT_TIMEOUT_MS")? {
            self.connect_timeout_ms = value;
        }

        if let Some(value) = env_number("STRESS_SEND_TIMEOUT_MS")? {
            self.send_timeout_ms = value;
        }

        if let Some(value) = env_number("STRESS_RECEIVE_TIMEOUT_MS")? {
            self.receive_timeout_ms = value;
        }

        if let Some(value) = env_number("STRESS_CLOSE_TIMEOUT_MS")? {
            self.close_timeout_ms = value;
        }

        if let Some(value) = env_number("STRESS_SUCCESS_DELAY_MS")? {
            self.success_delay_ms = value;
        }

        if let Some(value) = env_number("STRESS_FAILURE_DELAY_MS")? {
            self.failure_delay_ms = value;
        }

        if let Some(value) = env_number("STRESS_PAYLOAD_SIZE")? {
            self.payload_size = value as usize;
        }

        if let Some(value) = env_number("STRESS_REPORT_INTERVAL_SECS")? {
            self.report_interval_secs = value;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

fn env_number(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e))),
        Err(_) => Ok(None),
    }
}

// Default value functions for serde
fn default_target_addr() -> String {
    crate::defaults::DEFAULT_TARGET_ADDR.to_string()
}

fn default_target_path() -> String {
    crate::defaults::DEFAULT_TARGET_PATH.to_string()
}

fn default_scheme() -> String {
    crate::defaults::DEFAULT_SCHEME.to_string()
}

fn default_concurrency() -> usize {
    crate::defaults::DEFAULT_CONCURRENCY
}

fn default_timeout_ms() -> u64 {
    crate::defaults::DEFAULT_PHASE_TIMEOUT.as_millis() as u64
}

fn default_success_delay_ms() -> u64 {
    crate::defaults::DEFAULT_SUCCESS_DELAY.as_millis() as u64
}

fn default_failure_delay_ms() -> u64 {
    crate::defaults::DEFAULT_FAILURE_DELAY.as_millis() as u64
}

fn default_payload_size() -> usize {
    crate::defaults::DEFAULT_PAYLOAD_SIZE
}

fn default_report_interval_secs() -> u64 {
    crate::defaults::DEFAULT_REPORT_INTERVAL.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint().unwrap().as_str(), "ws://localhost:8090/");
        assert_eq!(config.concurrency, 200);
    }

    #[test]
    fn test_zero_concurrency_invalid() {
        let config = Config { concurrency: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_excessive_concurrency_invalid() {
        let config = Config { concurrency: MAX_CONCURRENCY + 1, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let config = Config { receive_timeout_ms: 0, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Receive timeout"));
    }

    #[test]
    fn test_invalid_scheme_invalid() {
        let config = Config { scheme: "http".to_string(), ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_iterations_invalid() {
        let config = Config { iterations: Some(0), ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let config = Config { quiet: true, verbose: true, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_configs() {
        let config = Config {
            receive_timeout_ms: 250,
            close_timeout_ms: 750,
            success_delay_ms: 0,
            failure_delay_ms: 10,
            concurrency: 4,
            iterations: Some(3),
            ..Config::default()
        };

        let runner = config.runner_config();
        assert_eq!(runner.receive_timeout, Duration::from_millis(250));
        assert_eq!(runner.close_timeout, Duration::from_millis(750));

        let driver = config.driver_config();
        assert_eq!(driver.concurrency, 4);
        assert_eq!(driver.success_delay, Duration::ZERO);
        assert_eq!(driver.failure_delay, Duration::from_millis(10));
        assert_eq!(driver.max_iterations, Some(3));
    }

    #[test]
    fn test_report_interval_zero_disables() {
        let config = Config { report_interval_secs: 0, ..Config::default() };
        assert!(config.report_interval().is_none());
        assert_eq!(Config::default().report_interval(), Some(Duration::from_secs(5)));
    }
}
