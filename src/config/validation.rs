//! Configuration validation utilities and rules

use crate::{
    error::Result,
    models::Config,
};

/// Concurrency above which a remote server may start refusing connections
const HIGH_CONCURRENCY: usize = 1_000;

/// Configuration validator producing advisory warnings
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run the hard checks of [`Config::validate`] then collect advisories
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_target(config)?);
        warnings.extend(Self::validate_load_settings(config));
        warnings.extend(Self::validate_timeouts(config));

        Ok(warnings)
    }

    fn validate_target(config: &Config) -> Result<Vec<ValidationWarning>> {
        let endpoint = config.endpoint()?;
        let mut warnings = Vec::new();

        if endpoint.is_secure() && endpoint.is_loopback() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("'{}' uses wss against a loopback address; the local server needs a valid certificate", endpoint),
            ));
        }

        if !endpoint.is_secure() && !endpoint.is_loopback() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("'{}' is a remote server over plain ws", endpoint),
            ));
        }

        Ok(warnings)
    }

    fn validate_load_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.concurrency > HIGH_CONCURRENCY {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Concurrency of {} opens that many sockets at once; check the file descriptor limit",
                    config.concurrency
                ),
            ));
        }

        if config.success_delay_ms == 0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Success delay is 0; workers reconnect as fast as the server allows".to_string(),
            ));
        }

        if config.failure_delay_ms < config.success_delay_ms {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Failure delay ({}ms) is shorter than success delay ({}ms); a failing server is hit harder",
                    config.failure_delay_ms, config.success_delay_ms
                ),
            ));
        }

        if config.iterations.is_none() && config.duration_secs.is_none() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "No --iterations or --duration given; the run continues until interrupted".to_string(),
            ));
        }

        warnings
    }

    fn validate_timeouts(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (name, value) in [
            ("Connect", config.connect_timeout_ms),
            ("Receive", config.receive_timeout_ms),
            ("Close", config.close_timeout_ms),
        ] {
            if value < 100 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("{} timeout of {}ms may report a slow server as broken", name, value),
                ));
            }
        }

        warnings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    pub fn format(&self) -> String {
        format!("[{}] {}", self.level.as_str(), self.message)
    }
}

/// Shorthand for [`ConfigValidator::validate_comprehensive`]
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
