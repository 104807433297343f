//! Main application orchestration and execution

use crate::{
    cli::Cli,
    client::ConnectionTestRunner,
    config::{display_config_summary, load_config, validate_config, ValidationLevel},
    error::{AppError, Result},
    executor::{outcome_channel, DriverReport, LoadDriver, Reporter, ShutdownHandle},
    logging::{LoadLogger, LoggerFactory},
    models::Config,
    output::{OutputCoordinator, OutputFormatterFactory},
    stats::StatsCollector,
};
use std::sync::Arc;
use std::time::Duration;

/// Success rate in percent below which a bounded run is reported as failed
const MIN_SUCCESS_RATE: f64 = 50.0;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;
        Ok(Self { cli })
    }

    /// Run the load test until it is bounded out or interrupted
    pub async fn run(self) -> Result<()> {
        let config = load_config(self.cli.clone())?;
        let warnings = validate_config(&config)?;

        let output = OutputCoordinator::new(OutputFormatterFactory::create_formatter(
            config.enable_color && self.cli.use_colors(),
            config.verbose,
        ));

        let endpoint = config.endpoint()?;
        let script = config.script();

        if !config.quiet {
            println!("{} v{}", crate::PKG_NAME, crate::VERSION);
            println!(
                "Target: {}  workers: {}  script: {} packets / {} bytes",
                endpoint,
                config.concurrency,
                script.len(),
                script.total_bytes()
            );
        }

        if config.debug {
            println!(
                "Built {} for {} ({})",
                crate::BUILD_TIME,
                crate::TARGET_TRIPLE,
                crate::GIT_COMMIT.unwrap_or("unknown commit")
            );
            println!("\nConfiguration Summary:");
            println!("{}\n", display_config_summary(&config));
        }

        for warning in &warnings {
            let show = match warning.level {
                ValidationLevel::Info => config.verbose || config.debug,
                ValidationLevel::Warning | ValidationLevel::Error => !config.quiet,
            };
            if show {
                eprintln!("{}", output.display_warning(&warning.message)?);
            }
        }

        let factory = LoggerFactory::new(config.clone());
        let app_logger = factory.create_logger("APP").await;
        let load_logger = factory.create_load_logger().await;
        crate::log_debug!(app_logger, "Session {} against {}", factory.session_id(), endpoint);

        let (outcome_tx, outcome_rx) = outcome_channel();
        let mut reporter = Reporter::new(outcome_rx, StatsCollector::default());
        if !config.quiet {
            reporter = reporter.with_periodic_output(output.clone(), config.report_interval());
        }
        let reporter_task = tokio::spawn(reporter.run());

        let runner = Arc::new(ConnectionTestRunner::new(config.runner_config()));
        let driver = LoadDriver::new(runner, config.driver_config())
            .with_outcomes(outcome_tx)
            .with_logger(load_logger.clone());

        let stop_task = tokio::spawn(stop_on_signal(
            driver.shutdown_handle(),
            config.run_duration(),
            load_logger,
        ));

        let report = driver.run(&endpoint, &script).await;
        stop_task.abort();
        // last outcome sender; the reporter finishes once it is gone
        drop(driver);

        let collector = reporter_task
            .await
            .map_err(|e| AppError::internal(format!("Reporter task failed: {}", e)))?;

        crate::log_info!(
            app_logger,
            "Run finished: {} tests, {:.1}% successful",
            report.total_iterations(),
            report.success_rate()
        );
        if report.aborted_workers > 0 {
            let error = AppError::internal(format!("{} worker task(s) aborted", report.aborted_workers));
            factory
                .create_error_logger()
                .log_error(&error, Some("load run"), Some(factory.session_id()))
                .await;
        }

        println!("{}", output.display_final_report(&collector.snapshot(), &report)?);

        check_outcome(&config, &report, &collector)
    }
}

/// Request shutdown on Ctrl-C or once the run duration elapses
async fn stop_on_signal(shutdown: ShutdownHandle, run_duration: Option<Duration>, logger: LoadLogger) {
    let deadline = async {
        match run_duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let reason = tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => "interrupted",
            // no signal handler; only the deadline can stop the run
            Err(_) => {
                (&mut deadline).await;
                "duration elapsed"
            }
        },
        _ = &mut deadline => "duration elapsed",
    };

    logger.log_shutdown(reason).await;
    shutdown.shutdown();
}

/// Bounded runs fail when too few tests succeeded.
///
/// A run in which every test failed the same way is reported by that cause:
/// never connecting is a network error, only expired waits is a timeout.
fn check_outcome(config: &Config, report: &DriverReport, collector: &StatsCollector) -> Result<()> {
    let bounded = config.iterations.is_some() || config.duration_secs.is_some();
    let total = report.total_iterations();

    if !bounded || total == 0 || report.success_rate() >= MIN_SUCCESS_RATE {
        return Ok(());
    }

    let failures = collector.failures_by_category();
    let only = |categories: &[&str]| {
        collector.successes() == 0
            && !failures.is_empty()
            && failures.keys().all(|category| categories.contains(category))
    };

    if only(&["DIAL"]) {
        Err(AppError::network(format!(
            "none of {} tests could connect to the echo server",
            total
        )))
    } else if only(&["RECEIVE_TIMEOUT", "CLOSE_TIMEOUT"]) {
        Err(AppError::timeout(format!(
            "all {} tests timed out waiting for the echo server",
            total
        )))
    } else {
        Err(AppError::test_execution(format!(
            "{:.1}% of {} tests succeeded - the echo server is failing or unreachable",
            report.success_rate(),
            total
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionTestError, TestFailure};
    use crate::executor::WorkerSummary;
    use crate::models::{IterationOutcome, TestResult};
    use crate::types::ConnectionPhase;
    use clap::Parser;

    fn report(successes: u64, failures: u64) -> DriverReport {
        DriverReport {
            workers: vec![WorkerSummary {
                worker_id: 0,
                iterations: successes + failures,
                successes,
                failures,
                last_error: None,
            }],
            elapsed: Duration::from_secs(1),
            aborted_workers: 0,
        }
    }

    fn collector(successes: u64, failures: &[ConnectionTestError]) -> StatsCollector {
        let mut collector = StatsCollector::new(16);
        for i in 0..successes {
            collector.record(&IterationOutcome::new(0, i + 1, Ok(TestResult::default())));
        }
        for (i, error) in failures.iter().enumerate() {
            let failure = TestFailure::new(error.clone(), ConnectionPhase::Dialing, TestResult::default());
            collector.record(&IterationOutcome::new(1, i as u64 + 1, Err(failure)));
        }
        collector
    }

    fn mixed_failures(n: usize) -> StatsCollector {
        let errors: Vec<_> = (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ConnectionTestError::Dial("refused".into())
                } else {
                    ConnectionTestError::ClosedEarly { received: 0, expected: 2 }
                }
            })
            .collect();
        collector(0, &errors)
    }

    #[test]
    fn test_app_rejects_conflicting_flags() {
        let cli = Cli::parse_from(["test", "--color", "--no-color"]);
        let err = App::new(cli).err().unwrap();
        assert_eq!(err.category(), "VALIDATION");
    }

    #[test]
    fn test_bounded_run_below_threshold_fails() {
        let config = Config { iterations: Some(4), ..Config::default() };
        let err = check_outcome(&config, &report(1, 3), &mixed_failures(3)).unwrap_err();
        assert_eq!(err.exit_code(), 6);
        assert!(err.to_string().contains("25.0%"));
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        let config = Config { iterations: Some(3), ..Config::default() };
        let dials = vec![ConnectionTestError::Dial("connection refused".into()); 3];

        let err = check_outcome(&config, &report(0, 3), &collector(0, &dials)).unwrap_err();

        assert_eq!(err.category(), "NETWORK");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("none of 3 tests"));
    }

    #[test]
    fn test_only_timeouts_is_timeout_error() {
        let config = Config { iterations: Some(2), ..Config::default() };
        let timeouts = [
            ConnectionTestError::ReceiveTimeout(Duration::from_millis(5)),
            ConnectionTestError::CloseTimeout(Duration::from_millis(5)),
        ];

        let err = check_outcome(&config, &report(0, 2), &collector(0, &timeouts)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_some_successes_keep_execution_error() {
        let config = Config { iterations: Some(4), ..Config::default() };
        let dials = vec![ConnectionTestError::Dial("refused".into()); 3];

        let err = check_outcome(&config, &report(1, 3), &collector(1, &dials)).unwrap_err();
        assert_eq!(err.category(), "TEST");
    }

    #[test]
    fn test_bounded_run_at_threshold_passes() {
        let config = Config { duration_secs: Some(10), ..Config::default() };
        assert!(check_outcome(&config, &report(2, 2), &mixed_failures(2)).is_ok());
    }

    #[test]
    fn test_unbounded_run_never_fails() {
        assert!(check_outcome(&Config::default(), &report(0, 10), &mixed_failures(10)).is_ok());
    }

    #[test]
    fn test_empty_run_passes() {
        let config = Config { iterations: Some(1), ..Config::default() };
        assert!(check_outcome(&config, &report(0, 0), &StatsCollector::default()).is_ok());
    }

    #[tokio::test]
    async fn test_stop_on_duration() {
        let driver = LoadDriver::new(
            Arc::new(ConnectionTestRunner::new(Default::default())),
            Default::default(),
        );
        let driver_shutdown = driver.shutdown_handle();
        let logger = LoadLogger::new(&Config { quiet: true, ..Config::default() });

        tokio::time::timeout(
            Duration::from_secs(5),
            stop_on_signal(driver_shutdown.clone(), Some(Duration::from_millis(20)), logger),
        )
        .await
        .unwrap();

        assert!(driver_shutdown.is_shutdown());
    }
}
