//! Concurrent load driver
//!
//! This module contains the execution engine for load runs:
//! - The [`ConnectionTest`] seam the driver runs tests through
//! - The [`LoadDriver`] owning a fixed-size pool of workers
//! - Worker pacing with success/failure delays and cooperative shutdown
//! - A reporter folding iteration outcomes into statistics

pub mod reporter;
pub mod worker;

pub use reporter::{outcome_channel, OutcomeReceiver, OutcomeSender, Reporter};
pub use worker::{Worker, WorkerSummary};

use crate::{
    error::TestFailure,
    logging::LoadLogger,
    models::{Endpoint, TestResult, TestScript},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Runs one complete connection test
#[async_trait]
pub trait ConnectionTest: Send + Sync {
    async fn run_test(&self, endpoint: &Endpoint, script: &TestScript) -> Result<TestResult, TestFailure>;
}

/// Worker pool and pacing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Number of concurrent workers
    pub concurrency: usize,
    /// Pause after a successful test
    pub success_delay: Duration,
    /// Pause after a failed test
    pub failure_delay: Duration,
    /// Stop each worker after this many tests; `None` runs until shutdown
    pub max_iterations: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            concurrency: crate::defaults::DEFAULT_CONCURRENCY,
            success_delay: crate::defaults::DEFAULT_SUCCESS_DELAY,
            failure_delay: crate::defaults::DEFAULT_FAILURE_DELAY,
            max_iterations: None,
        }
    }
}

/// Requests a cooperative stop of every worker of a driver
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Signal shutdown; workers stop after their in-flight test
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Summary of a completed load run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverReport {
    /// One summary per worker that returned normally
    pub workers: Vec<WorkerSummary>,
    /// Wall time from spawning the first worker to joining the last
    pub elapsed: Duration,
    /// Workers whose task panicked or was cancelled
    pub aborted_workers: usize,
}

impl DriverReport {
    pub fn total_iterations(&self) -> u64 {
        self.workers.iter().map(|w| w.iterations).sum()
    }

    pub fn successes(&self) -> u64 {
        self.workers.iter().map(|w| w.successes).sum()
    }

    pub fn failures(&self) -> u64 {
        self.workers.iter().map(|w| w.failures).sum()
    }

    /// Success rate in percent; 0 when no test ran
    pub fn success_rate(&self) -> f64 {
        match self.total_iterations() {
            0 => 0.0,
            total => self.successes() as f64 / total as f64 * 100.0,
        }
    }

    pub fn tests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_iterations() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Runs connection tests continuously from a fixed pool of workers.
///
/// Workers share no counters or locks. Each reports its outcomes through the
/// optional outcome channel and returns a [`WorkerSummary`] when it stops.
pub struct LoadDriver {
    runner: Arc<dyn ConnectionTest>,
    config: DriverConfig,
    shutdown_tx: Arc<watch::Sender<bool>>,
    outcomes: Option<OutcomeSender>,
    logger: Option<LoadLogger>,
}

impl LoadDriver {
    pub fn new(runner: Arc<dyn ConnectionTest>, config: DriverConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            runner,
            config,
            shutdown_tx: Arc::new(shutdown_tx),
            outcomes: None,
            logger: None,
        }
    }

    /// Forward every iteration outcome to `sender`
    pub fn with_outcomes(mut self, sender: OutcomeSender) -> Self {
        self.outcomes = Some(sender);
        self
    }

    /// Log every iteration through `logger`
    pub fn with_logger(mut self, logger: LoadLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { tx: self.shutdown_tx.clone() }
    }

    /// Run every worker with the same script
    pub async fn run(&self, endpoint: &Endpoint, script: &TestScript) -> DriverReport {
        self.run_with_scripts(endpoint, |_| script.clone()).await
    }

    /// Run with a script built per worker from its id
    pub async fn run_with_scripts<F>(&self, endpoint: &Endpoint, script_for: F) -> DriverReport
    where
        F: Fn(usize) -> TestScript,
    {
        let started = Instant::now();
        let endpoint = Arc::new(endpoint.clone());

        if let Some(logger) = &self.logger {
            logger.log_run_started(endpoint.as_str(), self.config.concurrency).await;
        }

        let handles: Vec<_> = (0..self.config.concurrency)
            .map(|worker_id| {
                let worker = Worker::new(
                    worker_id,
                    self.runner.clone(),
                    endpoint.clone(),
                    script_for(worker_id),
                    self.config.clone(),
                    self.shutdown_tx.subscribe(),
                )
                .with_outcomes(self.outcomes.clone())
                .with_logger(self.logger.clone());
                tokio::spawn(worker.run())
            })
            .collect();

        let mut report = DriverReport {
            workers: Vec::with_capacity(handles.len()),
            elapsed: Duration::ZERO,
            aborted_workers: 0,
        };

        for handle in handles {
            match handle.await {
                Ok(summary) => report.workers.push(summary),
                Err(_) => report.aborted_workers += 1,
            }
        }

        report.elapsed = started.elapsed();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(worker_id: usize, successes: u64, failures: u64) -> WorkerSummary {
        WorkerSummary {
            worker_id,
            iterations: successes + failures,
            successes,
            failures,
            last_error: None,
        }
    }

    #[test]
    fn test_driver_config_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.concurrency, 200);
        assert_eq!(config.success_delay, Duration::from_millis(100));
        assert_eq!(config.failure_delay, Duration::from_secs(3));
        assert!(config.max_iterations.is_none());
    }

    #[test]
    fn test_driver_report_totals() {
        let report = DriverReport {
            workers: vec![summary(0, 3, 1), summary(1, 4, 0)],
            elapsed: Duration::from_secs(2),
            aborted_workers: 0,
        };

        assert_eq!(report.total_iterations(), 8);
        assert_eq!(report.successes(), 7);
        assert_eq!(report.failures(), 1);
        assert!((report.success_rate() - 87.5).abs() < 1e-9);
        assert!((report.tests_per_second() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_report() {
        let report = DriverReport { workers: Vec::new(), elapsed: Duration::ZERO, aborted_workers: 0 };
        assert_eq!(report.success_rate(), 0.0);
        assert_eq!(report.tests_per_second(), 0.0);
    }

    #[test]
    fn test_shutdown_handle_without_receivers() {
        let (tx, _) = watch::channel(false);
        let handle = ShutdownHandle { tx: Arc::new(tx) };
        assert!(!handle.is_shutdown());
        handle.shutdown();
        assert!(handle.is_shutdown());
    }
}
