//! Performance benchmarks for the echo stress tester
//!
//! These cover the hot paths that run once per message or once per test:
//! echo verification, statistics folding and percentile computation, and
//! configuration loading.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use ws_echo_stress::{
    cli::Cli,
    client::EchoVerifier,
    config::ConfigParser,
    models::{Config, IterationOutcome, PacketKind, TestResult, TestScript},
    stats::{LatencyStatistics, StatsCollector},
};
use clap::Parser;

/// Create sample results with spread-out latencies
fn create_sample_results(count: usize) -> Vec<TestResult> {
    (0..count)
        .map(|i| {
            let connect = Duration::from_micros(200 + (i as u64 * 37) % 900);
            let full = Duration::from_micros(800 + (i as u64 * 53) % 4_000);
            let disconnect = Duration::from_micros(100 + (i as u64 * 11) % 300);
            TestResult {
                total_duration: connect + full + disconnect,
                connect_latency: connect,
                first_roundtrip_latency: full / 4,
                full_roundtrip_latency: full,
                disconnect_latency: disconnect,
            }
        })
        .collect()
}

/// Benchmark verifying every echo of a script
fn benchmark_echo_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("echo_verification");

    for size in [0usize, 4096, 65_536].iter() {
        let script = TestScript::standard(*size);

        group.bench_with_input(BenchmarkId::new("standard_script", size), size, |b, _| {
            b.iter(|| {
                let mut verifier = EchoVerifier::new(script.clone());
                for packet in script.iter() {
                    let _ = verifier.verify(packet.kind(), black_box(packet.payload()));
                }
                black_box(verifier.is_complete());
            });
        });
    }

    group.bench_function("detect_type_mismatch", |b| {
        let script = TestScript::standard(4096);
        b.iter(|| {
            let mut verifier = EchoVerifier::new(script.clone());
            let result = verifier.verify(PacketKind::Binary, black_box(b"Test"));
            black_box(result.is_err());
        });
    });

    group.finish();
}

/// Benchmark statistics calculation performance
fn benchmark_statistics_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [10usize, 100, 1000, 10_000].iter() {
        let samples: Vec<Duration> = create_sample_results(*size)
            .iter()
            .map(|r| r.full_roundtrip_latency)
            .collect();

        group.bench_with_input(BenchmarkId::new("from_samples", size), size, |b, _| {
            b.iter(|| {
                let stats = LatencyStatistics::from_samples(black_box(&samples));
                black_box(stats);
            });
        });

        let outcomes: Vec<IterationOutcome> = create_sample_results(*size)
            .into_iter()
            .enumerate()
            .map(|(i, result)| IterationOutcome::new(i % 16, i as u64, Ok(result)))
            .collect();

        group.bench_with_input(BenchmarkId::new("collect_and_snapshot", size), size, |b, _| {
            b.iter(|| {
                let mut collector = StatsCollector::default();
                for outcome in &outcomes {
                    collector.record(outcome);
                }
                black_box(collector.snapshot());
            });
        });
    }

    group.finish();
}

/// Benchmark configuration parsing from various sources
fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    let args = vec![
        "ws-echo-stress",
        "--addr", "127.0.0.1:9000",
        "-c", "64",
        "--receive-timeout", "2000",
        "-n", "100",
    ];

    group.bench_function("parse_cli_args", |b| {
        b.iter(|| {
            let cli = Cli::try_parse_from(black_box(&args)).unwrap();
            black_box(cli);
        });
    });

    group.bench_function("validate_config", |b| {
        let config = Config::default();
        b.iter(|| {
            black_box(config.validate().is_ok());
        });
    });

    group.bench_function("parse_from_cli", |b| {
        let cli = Cli::try_parse_from(&args).unwrap();
        b.iter(|| {
            let config = ConfigParser::new(black_box(cli.clone())).parse();
            black_box(config.is_ok());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_echo_verification,
    benchmark_statistics_calculation,
    benchmark_config_parsing
);

criterion_main!(benches);
