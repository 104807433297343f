//! A single load worker and its pacing loop

use super::{ConnectionTest, DriverConfig, OutcomeSender};
use crate::{
    logging::LoadLogger,
    models::{Endpoint, IterationOutcome, TestScript},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// What one worker did before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub iterations: u64,
    pub successes: u64,
    pub failures: u64,
    /// Message of the most recent failure
    pub last_error: Option<String>,
}

impl WorkerSummary {
    pub fn new(worker_id: usize) -> Self {
        Self { worker_id, ..Self::default() }
    }
}

/// Repeats connection tests until shutdown or its iteration bound
pub struct Worker {
    id: usize,
    runner: Arc<dyn ConnectionTest>,
    endpoint: Arc<Endpoint>,
    script: TestScript,
    config: DriverConfig,
    shutdown: watch::Receiver<bool>,
    outcomes: Option<OutcomeSender>,
    logger: Option<LoadLogger>,
}

impl Worker {
    pub fn new(
        id: usize,
        runner: Arc<dyn ConnectionTest>,
        endpoint: Arc<Endpoint>,
        script: TestScript,
        config: DriverConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            runner,
            endpoint,
            script,
            config,
            shutdown,
            outcomes: None,
            logger: None,
        }
    }

    pub fn with_outcomes(mut self, outcomes: Option<OutcomeSender>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn with_logger(mut self, logger: Option<LoadLogger>) -> Self {
        self.logger = logger;
        self
    }

    fn bound_reached(&self, summary: &WorkerSummary) -> bool {
        self.config.max_iterations.is_some_and(|max| summary.iterations >= max)
    }

    /// Run the loop. An in-flight test always completes; shutdown is only
    /// observed between iterations and during pauses.
    pub async fn run(mut self) -> WorkerSummary {
        let mut summary = WorkerSummary::new(self.id);

        if let Some(logger) = &self.logger {
            logger.log_worker_started(self.id).await;
        }

        while !*self.shutdown.borrow() && !self.bound_reached(&summary) {
            let outcome = self.runner.run_test(&self.endpoint, &self.script).await;

            summary.iterations += 1;
            let delay = match &outcome {
                Ok(_) => {
                    summary.successes += 1;
                    self.config.success_delay
                }
                Err(failure) => {
                    summary.failures += 1;
                    summary.last_error = Some(failure.to_string());
                    self.config.failure_delay
                }
            };

            let outcome = IterationOutcome::new(self.id, summary.iterations, outcome);
            if let Some(logger) = &self.logger {
                logger.log_iteration(&outcome).await;
            }
            if let Some(outcomes) = &self.outcomes {
                // a closed reporter never stops the load
                let _ = outcomes.send(outcome);
            }

            if self.bound_reached(&summary) || self.pause(delay).await {
                break;
            }
        }

        if let Some(logger) = &self.logger {
            logger.log_worker_stopped(&summary).await;
        }
        summary
    }

    /// Sleep for `delay`; returns true when shutdown interrupted it
    async fn pause(&mut self, delay: Duration) -> bool {
        if delay.is_zero() {
            tokio::task::yield_now().await;
            return *self.shutdown.borrow();
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            changed = self.shutdown.changed() => match changed {
                Ok(()) => *self.shutdown.borrow(),
                // driver gone, nobody can stop us later
                Err(_) => true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionTestError, TestFailure};
    use crate::models::TestResult;
    use crate::types::ConnectionPhase;
    use async_trait::async_trait;

    struct AlwaysOk;

    #[async_trait]
    impl ConnectionTest for AlwaysOk {
        async fn run_test(&self, _: &Endpoint, _: &TestScript) -> Result<TestResult, TestFailure> {
            Ok(TestResult::default())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl ConnectionTest for AlwaysFails {
        async fn run_test(&self, _: &Endpoint, _: &TestScript) -> Result<TestResult, TestFailure> {
            Err(TestFailure::new(
                ConnectionTestError::Dial("refused".into()),
                ConnectionPhase::Dialing,
                TestResult::default(),
            ))
        }
    }

    fn worker(runner: Arc<dyn ConnectionTest>, config: DriverConfig, shutdown: watch::Receiver<bool>) -> Worker {
        Worker::new(
            3,
            runner,
            Arc::new(Endpoint::new("ws", "127.0.0.1:9", "/").unwrap()),
            TestScript::builder().text("a").build().unwrap(),
            config,
            shutdown,
        )
    }

    #[tokio::test]
    async fn test_worker_stops_at_bound() {
        let (_tx, rx) = watch::channel(false);
        let config = DriverConfig {
            concurrency: 1,
            success_delay: Duration::ZERO,
            failure_delay: Duration::ZERO,
            max_iterations: Some(5),
        };

        let summary = worker(Arc::new(AlwaysOk), config, rx).run().await;

        assert_eq!(summary.worker_id, 3);
        assert_eq!(summary.iterations, 5);
        assert_eq!(summary.successes, 5);
        assert_eq!(summary.failures, 0);
    }

    #[tokio::test]
    async fn test_worker_does_not_start_after_shutdown() {
        let (tx, rx) = watch::channel(false);
        tx.send_replace(true);

        let summary = worker(Arc::new(AlwaysOk), DriverConfig::default(), rx).run().await;
        assert_eq!(summary.iterations, 0);
    }

    #[tokio::test]
    async fn test_failure_pause_is_interruptible() {
        let (tx, rx) = watch::channel(false);
        let config = DriverConfig {
            concurrency: 1,
            success_delay: Duration::ZERO,
            failure_delay: Duration::from_secs(60),
            max_iterations: None,
        };

        let handle = tokio::spawn(worker(Arc::new(AlwaysFails), config, rx).run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send_replace(true);

        let summary = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker should stop during its pause")
            .unwrap();
        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.failures, 1);
        assert!(summary.last_error.unwrap().contains("dial failed"));
    }

    #[tokio::test]
    async fn test_pause_is_pending_until_shutdown() {
        let (tx, rx) = watch::channel(false);
        let mut worker = worker(Arc::new(AlwaysOk), DriverConfig::default(), rx);

        let mut pause = tokio_test::task::spawn(worker.pause(Duration::from_secs(60)));
        tokio_test::assert_pending!(pause.poll());

        tx.send_replace(true);
        assert!(pause.is_woken());
        assert!(tokio_test::assert_ready!(pause.poll()));
    }

    #[tokio::test]
    async fn test_outcomes_are_forwarded() {
        let (_tx, rx) = watch::channel(false);
        let (outcome_tx, mut outcome_rx) = super::super::outcome_channel();
        let config = DriverConfig {
            concurrency: 1,
            success_delay: Duration::ZERO,
            failure_delay: Duration::ZERO,
            max_iterations: Some(2),
        };

        worker(Arc::new(AlwaysOk), config, rx).with_outcomes(Some(outcome_tx)).run().await;

        let first = outcome_rx.recv().await.unwrap();
        let second = outcome_rx.recv().await.unwrap();
        assert_eq!((first.worker_id, first.iteration), (3, 1));
        assert_eq!(second.iteration, 2);
        // sender dropped with the worker
        assert!(outcome_rx.recv().await.is_none());
    }
}
