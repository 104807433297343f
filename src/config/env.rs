//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# WebSocket Echo Stress Tester Configuration
#
# Values here become defaults for every run; command-line arguments
# override them.

# Echo server address (host:port) and request path
# STRESS_ADDR=localhost:8090
# STRESS_PATH=/

# ws or wss
# STRESS_SCHEME=ws

# Number of concurrent workers
# STRESS_CONCURRENCY=200

# Per-phase timeouts in milliseconds
# STRESS_CONNECT_TIMEOUT_MS=5000
# STRESS_SEND_TIMEOUT_MS=5000
# STRESS_RECEIVE_TIMEOUT_MS=5000
# STRESS_CLOSE_TIMEOUT_MS=5000

# Pause between iterations of one worker, in milliseconds
# STRESS_SUCCESS_DELAY_MS=100
# STRESS_FAILURE_DELAY_MS=3000

# Size of the random binary packet in bytes
# STRESS_PAYLOAD_SIZE=4096

# Seconds between progress reports (0 disables them)
# STRESS_REPORT_INTERVAL_SECS=5

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Example configurations for different scenarios:
#
# Gentle smoke test against a remote server:
# STRESS_ADDR=echo.example.com:443
# STRESS_SCHEME=wss
# STRESS_CONCURRENCY=10
#
# Saturating a local server:
# STRESS_CONCURRENCY=2000
# STRESS_SUCCESS_DELAY_MS=0
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();

        match key {
            "STRESS_ADDR" => {
                if value.is_empty() {
                    return Err(AppError::config("STRESS_ADDR cannot be empty"));
                }
            }
            "STRESS_SCHEME" => {
                if !matches!(value.to_lowercase().as_str(), "ws" | "wss") {
                    return Err(AppError::config(format!("STRESS_SCHEME must be ws or wss, got: {}", value)));
                }
            }
            "STRESS_CONCURRENCY" => {
                let count = parse_number(key, value)?;
                if count == 0 || count > crate::models::config::MAX_CONCURRENCY as u64 {
                    return Err(AppError::config(format!(
                        "STRESS_CONCURRENCY must be between 1 and {}, got: {}",
                        crate::models::config::MAX_CONCURRENCY,
                        count
                    )));
                }
            }
            "STRESS_CONNECT_TIMEOUT_MS" | "STRESS_SEND_TIMEOUT_MS" | "STRESS_RECEIVE_TIMEOUT_MS"
            | "STRESS_CLOSE_TIMEOUT_MS" => {
                let timeout = parse_number(key, value)?;
                if timeout == 0 || timeout > crate::models::config::MAX_TIMEOUT_MS {
                    return Err(AppError::config(format!(
                        "{} must be between 1 and {}, got: {}",
                        key,
                        crate::models::config::MAX_TIMEOUT_MS,
                        timeout
                    )));
                }
            }
            "STRESS_SUCCESS_DELAY_MS" | "STRESS_FAILURE_DELAY_MS" => {
                let delay = parse_number(key, value)?;
                if delay > crate::models::config::MAX_DELAY_MS {
                    return Err(AppError::config(format!(
                        "{} cannot exceed {}, got: {}",
                        key,
                        crate::models::config::MAX_DELAY_MS,
                        delay
                    )));
                }
            }
            "STRESS_PAYLOAD_SIZE" | "STRESS_REPORT_INTERVAL_SECS" => {
                parse_number(key, value)?;
            }
            "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("STRESS_ADDR", "Echo server address as host:port", "localhost:8090"),
            ("STRESS_PATH", "Request path", "/"),
            ("STRESS_SCHEME", "ws or wss", "ws"),
            ("STRESS_CONCURRENCY", "Number of concurrent workers", "200"),
            ("STRESS_CONNECT_TIMEOUT_MS", "Dial timeout in milliseconds", "5000"),
            ("STRESS_SEND_TIMEOUT_MS", "Per-message send timeout in milliseconds", "5000"),
            ("STRESS_RECEIVE_TIMEOUT_MS", "Timeout for all echoes in milliseconds", "5000"),
            ("STRESS_CLOSE_TIMEOUT_MS", "Close acknowledgment timeout in milliseconds", "5000"),
            ("STRESS_SUCCESS_DELAY_MS", "Pause after a successful test", "100"),
            ("STRESS_FAILURE_DELAY_MS", "Pause after a failed test", "3000"),
            ("STRESS_PAYLOAD_SIZE", "Random binary packet size in bytes", "4096"),
            ("STRESS_REPORT_INTERVAL_SECS", "Seconds between progress reports", "5"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<28} {}\n", var, description));
            help.push_str(&format!("  {:<28} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_env_manager_create_example_content() {
        let content = EnvManager::create_example_env_content();
        assert!(content.contains("STRESS_ADDR"));
        assert!(content.contains("STRESS_CONCURRENCY"));
        assert!(content.contains("STRESS_RECEIVE_TIMEOUT_MS"));
        assert!(content.contains("ENABLE_COLOR"));

        // every documented variable appears in the template
        for (var, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(var), "missing {}", var);
        }
    }

    #[test]
    fn test_env_manager_save_example_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env.example");

        EnvManager::save_example_env_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, EnvManager::create_example_env_content());
    }

    #[test]
    fn test_env_manager_validate_env_var() {
        assert!(EnvManager::validate_env_var("STRESS_ADDR", "localhost:8090").is_ok());
        assert!(EnvManager::validate_env_var("STRESS_ADDR", "  ").is_err());

        assert!(EnvManager::validate_env_var("STRESS_SCHEME", "WSS").is_ok());
        assert!(EnvManager::validate_env_var("STRESS_SCHEME", "http").is_err());

        assert!(EnvManager::validate_env_var("STRESS_CONCURRENCY", "50").is_ok());
        assert!(EnvManager::validate_env_var("STRESS_CONCURRENCY", "0").is_err());
        assert!(EnvManager::validate_env_var("STRESS_CONCURRENCY", "many").is_err());

        assert!(EnvManager::validate_env_var("STRESS_RECEIVE_TIMEOUT_MS", "250").is_ok());
        assert!(EnvManager::validate_env_var("STRESS_RECEIVE_TIMEOUT_MS", "0").is_err());

        assert!(EnvManager::validate_env_var("STRESS_SUCCESS_DELAY_MS", "0").is_ok());
        assert!(EnvManager::validate_env_var("STRESS_FAILURE_DELAY_MS", "999999999").is_err());

        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());

        // unknown variables are ignored
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "x").is_ok());
    }

    #[test]
    fn test_get_supported_env_vars() {
        let vars = EnvManager::get_supported_env_vars();
        assert_eq!(vars.len(), 13);
        assert!(vars.iter().any(|(name, _, _)| *name == "STRESS_PAYLOAD_SIZE"));
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("Supported Environment Variables"));
        assert!(help.contains("STRESS_CLOSE_TIMEOUT_MS"));
        assert!(help.contains("Configuration Priority"));
    }
}
