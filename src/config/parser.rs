//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        self.load_env_file()?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Load .env file if it exists
    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(addr) = &cli.addr {
            config.target_addr = addr.clone();
        }
        if let Some(path) = &cli.path {
            config.target_path = path.clone();
        }
        if let Some(scheme) = &cli.scheme {
            config.scheme = scheme.to_lowercase();
        }
        if let Some(concurrency) = cli.concurrency {
            config.concurrency = concurrency;
        }

        if let Some(ms) = cli.connect_timeout {
            config.connect_timeout_ms = ms;
        }
        if let Some(ms) = cli.send_timeout {
            config.send_timeout_ms = ms;
        }
        if let Some(ms) = cli.receive_timeout {
            config.receive_timeout_ms = ms;
        }
        if let Some(ms) = cli.close_timeout {
            config.close_timeout_ms = ms;
        }
        if let Some(ms) = cli.success_delay {
            config.success_delay_ms = ms;
        }
        if let Some(ms) = cli.failure_delay {
            config.failure_delay_ms = ms;
        }

        if let Some(size) = cli.payload_size {
            config.payload_size = size;
        }
        if cli.iterations.is_some() {
            config.iterations = cli.iterations;
        }
        if cli.duration.is_some() {
            config.duration_secs = cli.duration;
        }
        if let Some(secs) = cli.report_interval {
            config.report_interval_secs = secs;
        }
        if let Some(format) = cli.log_format {
            config.log_format = format;
        }

        if cli.no_color {
            config.enable_color = false;
        } else if cli.color {
            config.enable_color = true;
        }

        // CLI-only
        config.quiet = cli.quiet;
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: target={}://{}{}, concurrency={}, enable_color={}",
                config.scheme, config.target_addr, config.target_path, config.concurrency, config.enable_color
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let endpoint = config
        .endpoint()
        .map(|e| e.to_string())
        .unwrap_or_else(|e| format!("<invalid: {}>", e));

    let mut summary = Vec::new();
    summary.push(format!("Target: {}", endpoint));
    summary.push(format!("Concurrency: {}", config.concurrency));
    summary.push(format!(
        "Timeouts: connect {}ms, send {}ms, receive {}ms, close {}ms",
        config.connect_timeout_ms, config.send_timeout_ms, config.receive_timeout_ms, config.close_timeout_ms
    ));
    summary.push(format!(
        "Delays: success {}ms, failure {}ms",
        config.success_delay_ms, config.failure_delay_ms
    ));
    summary.push(format!("Payload Size: {} bytes", config.payload_size));
    summary.push(format!(
        "Iterations: {}",
        config.iterations.map_or("unbounded".to_string(), |n| n.to_string())
    ));
    summary.push(format!(
        "Duration: {}",
        config.duration_secs.map_or("unbounded".to_string(), |s| format!("{}s", s))
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
