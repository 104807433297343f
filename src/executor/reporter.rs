//! Background aggregation of iteration outcomes

use crate::{
    models::IterationOutcome,
    output::OutputCoordinator,
    stats::StatsCollector,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub type OutcomeSender = mpsc::UnboundedSender<IterationOutcome>;
pub type OutcomeReceiver = mpsc::UnboundedReceiver<IterationOutcome>;

/// Unbounded channel from workers to the reporter; sending never blocks
pub fn outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel()
}

/// Folds outcomes into a [`StatsCollector`] and prints periodic summaries
pub struct Reporter {
    receiver: OutcomeReceiver,
    collector: StatsCollector,
    output: Option<OutputCoordinator>,
    interval: Option<Duration>,
}

impl Reporter {
    pub fn new(receiver: OutcomeReceiver, collector: StatsCollector) -> Self {
        Self {
            receiver,
            collector,
            output: None,
            interval: None,
        }
    }

    /// Print a progress line through `output` every `interval`
    pub fn with_periodic_output(mut self, output: OutputCoordinator, interval: Option<Duration>) -> Self {
        self.output = Some(output);
        self.interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Consume outcomes until every sender is dropped
    pub async fn run(mut self) -> StatsCollector {
        let mut ticker = self.interval.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                received = self.receiver.recv() => match received {
                    Some(outcome) => self.collector.record(&outcome),
                    None => break,
                },
                _ = next_tick(&mut ticker) => self.print_progress(),
            }
        }

        self.collector
    }

    fn print_progress(&self) {
        if let Some(output) = &self.output {
            if let Ok(line) = output.display_progress(&self.collector.snapshot()) {
                println!("{}", line);
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionTestError, TestFailure};
    use crate::models::TestResult;
    use crate::output::OutputFormatterFactory;
    use crate::types::ConnectionPhase;

    #[tokio::test]
    async fn test_reporter_collects_until_senders_drop() {
        let (tx, rx) = outcome_channel();
        let reporter = tokio::spawn(Reporter::new(rx, StatsCollector::new(16)).run());

        tx.send(IterationOutcome::new(0, 1, Ok(TestResult::default()))).unwrap();
        tx.send(IterationOutcome::new(
            1,
            1,
            Err(TestFailure::new(
                ConnectionTestError::CloseTimeout(Duration::from_secs(5)),
                ConnectionPhase::Closing,
                TestResult::default(),
            )),
        ))
        .unwrap();
        drop(tx);

        let collector = reporter.await.unwrap();
        assert_eq!(collector.successes(), 1);
        assert_eq!(collector.failures(), 1);
        assert_eq!(collector.failures_by_category().get("CLOSE_TIMEOUT"), Some(&1));
    }

    #[tokio::test]
    async fn test_reporter_with_periodic_output() {
        let (tx, rx) = outcome_channel();
        let output = OutputCoordinator::new(OutputFormatterFactory::create_plain_formatter());
        let reporter = tokio::spawn(
            Reporter::new(rx, StatsCollector::new(16))
                .with_periodic_output(output, Some(Duration::from_millis(10)))
                .run(),
        );

        tx.send(IterationOutcome::new(0, 1, Ok(TestResult::default()))).unwrap();
        tokio::time::sleep(Duration::from_millis(35)).await;
        drop(tx);

        let collector = reporter.await.unwrap();
        assert_eq!(collector.total(), 1);
    }
}
