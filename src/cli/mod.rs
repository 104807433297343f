//! Command-line interface module

use crate::logging::LogFormat;
use clap::Parser;

/// WebSocket Echo Stress Tester - verifies echoes and measures latency under load
#[derive(Parser, Debug, Clone)]
#[command(name = "ws-echo-stress")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Server address as host:port [default: localhost:8090]
    #[arg(long, value_name = "HOST:PORT")]
    pub addr: Option<String>,

    /// Request path [default: /]
    #[arg(long)]
    pub path: Option<String>,

    /// WebSocket scheme, ws or wss [default: ws]
    #[arg(long)]
    pub scheme: Option<String>,

    /// Number of concurrent workers [default: 200]
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Dial timeout in milliseconds [default: 5000]
    #[arg(long, value_name = "MS", value_parser = parse_millis)]
    pub connect_timeout: Option<u64>,

    /// Per-message send timeout in milliseconds [default: 5000]
    #[arg(long, value_name = "MS", value_parser = parse_millis)]
    pub send_timeout: Option<u64>,

    /// Timeout for receiving all echoes in milliseconds [default: 5000]
    #[arg(long, value_name = "MS", value_parser = parse_millis)]
    pub receive_timeout: Option<u64>,

    /// Timeout for the close acknowledgment in milliseconds [default: 5000]
    #[arg(long, value_name = "MS", value_parser = parse_millis)]
    pub close_timeout: Option<u64>,

    /// Pause after a successful test in milliseconds [default: 100]
    #[arg(long, value_name = "MS")]
    pub success_delay: Option<u64>,

    /// Pause after a failed test in milliseconds [default: 3000]
    #[arg(long, value_name = "MS")]
    pub failure_delay: Option<u64>,

    /// Size of the random binary packet in bytes [default: 4096]
    #[arg(long, value_name = "BYTES")]
    pub payload_size: Option<usize>,

    /// Stop each worker after this many tests
    #[arg(short = 'n', long)]
    pub iterations: Option<u64>,

    /// Stop the run after this many seconds
    #[arg(short = 'd', long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Seconds between progress reports, 0 disables them [default: 5]
    #[arg(long, value_name = "SECS")]
    pub report_interval: Option<u64>,

    /// Log line format [default: console]
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Only print warnings and errors
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Log every test result
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.quiet && (self.verbose || self.debug) {
            return Err("Cannot combine --quiet with --verbose or --debug".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("--concurrency must be greater than 0".to_string());
        }

        if self.iterations == Some(0) {
            return Err("--iterations must be greater than 0".to_string());
        }

        if self.duration == Some(0) {
            return Err("--duration must be greater than 0".to_string());
        }

        if let Some(scheme) = &self.scheme {
            if !matches!(scheme.to_lowercase().as_str(), "ws" | "wss") {
                return Err(format!("Invalid scheme '{}': expected ws or wss", scheme));
            }
        }

        Ok(())
    }

    /// Whether the run ends by itself
    pub fn is_bounded(&self) -> bool {
        self.iterations.is_some() || self.duration.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse a timeout in milliseconds
fn parse_millis(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid timeout: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|ms| {
            if ms == 0 {
                Err("Timeout must be greater than 0".to_string())
            } else if ms > crate::models::config::MAX_TIMEOUT_MS {
                Err(format!("Timeout cannot exceed {} milliseconds", crate::models::config::MAX_TIMEOUT_MS))
            } else {
                Ok(ms)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["test"]);
        assert!(cli.addr.is_none());
        assert!(cli.concurrency.is_none());
        assert!(cli.log_format.is_none());
        assert!(!cli.verbose);
        assert!(!cli.is_bounded());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "test",
            "--addr", "127.0.0.1:9000",
            "--path", "/echo",
            "--scheme", "wss",
            "-c", "16",
            "--connect-timeout", "1000",
            "--send-timeout", "2000",
            "--receive-timeout", "3000",
            "--close-timeout", "4000",
            "--success-delay", "0",
            "--failure-delay", "250",
            "--payload-size", "128",
            "-n", "10",
            "-d", "30",
            "--report-interval", "0",
            "--log-format", "json",
            "--no-color",
            "--verbose",
        ]);

        assert_eq!(cli.addr.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(cli.path.as_deref(), Some("/echo"));
        assert_eq!(cli.scheme.as_deref(), Some("wss"));
        assert_eq!(cli.concurrency, Some(16));
        assert_eq!(cli.connect_timeout, Some(1000));
        assert_eq!(cli.send_timeout, Some(2000));
        assert_eq!(cli.receive_timeout, Some(3000));
        assert_eq!(cli.close_timeout, Some(4000));
        assert_eq!(cli.success_delay, Some(0));
        assert_eq!(cli.failure_delay, Some(250));
        assert_eq!(cli.payload_size, Some(128));
        assert_eq!(cli.iterations, Some(10));
        assert_eq!(cli.duration, Some(30));
        assert_eq!(cli.report_interval, Some(0));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(cli.no_color);
        assert!(cli.verbose);
        assert!(cli.is_bounded());
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_millis("1500"), Ok(1500));
        assert!(parse_millis("0").is_err());
        assert!(parse_millis("300001").is_err());
        assert!(parse_millis("+5").is_err());
        assert!(parse_millis("0x10").is_err());
        assert!(parse_millis("abc").is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected_by_clap() {
        assert!(Cli::try_parse_from(["test", "--receive-timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["test", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_validation_conflicts() {
        let cli = Cli::parse_from(["test", "--color", "--no-color"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["test", "--quiet", "--debug"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["test", "--scheme", "http"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["test", "-c", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_use_colors_method() {
        let cli = Cli::parse_from(["test", "--color"]);
        assert!(cli.use_colors());

        let cli = Cli::parse_from(["test", "--no-color"]);
        assert!(!cli.use_colors());
    }
}
