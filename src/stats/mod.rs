//! Latency statistics and outcome aggregation for load runs

use crate::{
    error::TestFailure,
    models::{IterationOutcome, TestResult},
    types::PerformanceLevel,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// Distribution summary of one latency phase, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStatistics {
    pub count: usize,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub std_dev_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
}

impl LatencyStatistics {
    /// Summarize a set of samples; `None` when there are none
    pub fn from_samples<'a, I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Duration>,
    {
        let mut values: Vec<f64> = samples.into_iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = values.len();
        let avg_ms = values.iter().sum::<f64>() / count as f64;

        Some(Self {
            count,
            min_ms: values[0],
            avg_ms,
            max_ms: values[count - 1],
            std_dev_ms: standard_deviation(&values, avg_ms),
            p50_ms: nearest_rank(&values, 50.0),
            p90_ms: nearest_rank(&values, 90.0),
            p99_ms: nearest_rank(&values, 99.0),
        })
    }

    pub fn performance_level(&self) -> PerformanceLevel {
        PerformanceLevel::from_millis(self.avg_ms)
    }
}

/// Nearest-rank percentile of sorted values
fn nearest_rank(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let rank = ((percentile / 100.0) * sorted_values.len() as f64).ceil() as usize;
    sorted_values[rank.clamp(1, sorted_values.len()) - 1]
}

/// Sample standard deviation
fn standard_deviation(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let variance = values.iter()
        .map(|x| (x - mean).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Keeps the most recent `capacity` samples
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn statistics(&self) -> Option<LatencyStatistics> {
        LatencyStatistics::from_samples(&self.samples)
    }
}

/// Per-phase sample windows
#[derive(Debug, Clone)]
struct PhaseSamples {
    connect: SampleWindow,
    first_roundtrip: SampleWindow,
    full_roundtrip: SampleWindow,
    disconnect: SampleWindow,
    total: SampleWindow,
}

impl PhaseSamples {
    fn new(capacity: usize) -> Self {
        Self {
            connect: SampleWindow::new(capacity),
            first_roundtrip: SampleWindow::new(capacity),
            full_roundtrip: SampleWindow::new(capacity),
            disconnect: SampleWindow::new(capacity),
            total: SampleWindow::new(capacity),
        }
    }

    fn record(&mut self, result: &TestResult) {
        self.connect.push(result.connect_latency);
        self.first_roundtrip.push(result.first_roundtrip_latency);
        self.full_roundtrip.push(result.full_roundtrip_latency);
        self.disconnect.push(result.disconnect_latency);
        self.total.push(result.total_duration);
    }
}

/// Folds iteration outcomes into counts and latency distributions
#[derive(Debug, Clone)]
pub struct StatsCollector {
    successes: u64,
    failures: u64,
    failures_by_category: BTreeMap<&'static str, u64>,
    last_failure: Option<TestFailure>,
    samples: PhaseSamples,
    started_at: Instant,
}

impl StatsCollector {
    /// Collector keeping up to `capacity` samples per phase
    pub fn new(capacity: usize) -> Self {
        Self {
            successes: 0,
            failures: 0,
            failures_by_category: BTreeMap::new(),
            last_failure: None,
            samples: PhaseSamples::new(capacity),
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, outcome: &IterationOutcome) {
        match &outcome.outcome {
            Ok(result) => {
                self.successes += 1;
                self.samples.record(result);
            }
            Err(failure) => {
                self.failures += 1;
                *self.failures_by_category.entry(failure.category()).or_insert(0) += 1;
                self.last_failure = Some(failure.clone());
            }
        }
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    /// Success rate in percent; 0 when nothing was recorded
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.successes as f64 / total as f64 * 100.0,
        }
    }

    pub fn failures_by_category(&self) -> &BTreeMap<&'static str, u64> {
        &self.failures_by_category
    }

    pub fn last_failure(&self) -> Option<&TestFailure> {
        self.last_failure.as_ref()
    }

    /// Point-in-time view used by the formatters
    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed = self.started_at.elapsed();
        let secs = elapsed.as_secs_f64();

        StatsSnapshot {
            elapsed,
            successes: self.successes,
            failures: self.failures,
            success_rate: self.success_rate(),
            tests_per_second: if secs > 0.0 { self.total() as f64 / secs } else { 0.0 },
            connect: self.samples.connect.statistics(),
            first_roundtrip: self.samples.first_roundtrip.statistics(),
            full_roundtrip: self.samples.full_roundtrip.statistics(),
            disconnect: self.samples.disconnect.statistics(),
            total: self.samples.total.statistics(),
            failures_by_category: self
                .failures_by_category
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            last_failure: self.last_failure.as_ref().map(|f| f.to_string()),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_SAMPLE_CAPACITY)
    }
}

/// Aggregated state of a run at one moment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub elapsed: Duration,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub tests_per_second: f64,
    pub connect: Option<LatencyStatistics>,
    pub first_roundtrip: Option<LatencyStatistics>,
    pub full_roundtrip: Option<LatencyStatistics>,
    pub disconnect: Option<LatencyStatistics>,
    pub total: Option<LatencyStatistics>,
    pub failures_by_category: BTreeMap<String, u64>,
    pub last_failure: Option<String>,
}

impl StatsSnapshot {
    pub fn total_tests(&self) -> u64 {
        self.successes + self.failures
    }

    /// Phases in display order with their labels
    pub fn phases(&self) -> [(&'static str, Option<&LatencyStatistics>); 5] {
        [
            ("Connect", self.connect.as_ref()),
            ("First roundtrip", self.first_roundtrip.as_ref()),
            ("Full roundtrip", self.full_roundtrip.as_ref()),
            ("Disconnect", self.disconnect.as_ref()),
            ("Total", self.total.as_ref()),
        ]
    }
}
