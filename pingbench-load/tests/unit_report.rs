use pingbench_common::RpcShape;
use pingbench_load::config::BenchmarkConfig;
use pingbench_load::metrics::{LatencySample, RunResults};
use pingbench_load::report::BenchmarkReport;
use std::time::Duration;

fn results(latencies_ms: &[u64], failures: u64) -> RunResults {
    let samples: Vec<LatencySample> = latencies_ms
        .iter()
        .enumerate()
        .map(|(i, &ms)| LatencySample {
            latency: Duration::from_millis(ms),
            success: (i as u64) >= failures,
        })
        .collect();
    let successes = samples.len() as u64 - failures;
    RunResults { samples, successes, failures }
}

#[test]
fn test_report_throughput_and_counts() {
    let mut config = BenchmarkConfig::new(RpcShape::Unary);
    config.total_requests = 10;
    config.concurrency = 5;

    let report = BenchmarkReport::new(&config, results(&[1; 10], 2), Duration::from_secs(2));
    assert_eq!(report.requested, 10);
    assert_eq!(report.issued, 10);
    assert_eq!(report.successes, 8);
    assert_eq!(report.failures, 2);
    assert_eq!(report.samples, 10);
    assert_eq!(report.requests_per_second, 4.0);
}

#[test]
fn test_report_zero_elapsed_has_zero_throughput() {
    let config = BenchmarkConfig::new(RpcShape::Unary);
    let report = BenchmarkReport::new(&config, RunResults::default(), Duration::ZERO);
    assert_eq!(report.requests_per_second, 0.0);
    assert_eq!(report.latency.p50, Duration::ZERO);
}

#[test]
fn test_report_json_uses_millis_and_names() {
    let mut config = BenchmarkConfig::new(RpcShape::ServerStream);
    config.total_requests = 2;
    config.concurrency = 1;

    let report = BenchmarkReport::new(&config, results(&[2, 4], 0), Duration::from_millis(1500));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["shape"], "server-stream");
    assert_eq!(json["scenario"], "constant");
    assert_eq!(json["elapsed_ms"], 1500.0);
    assert_eq!(json["latency"]["p50_ms"], 4.0);
    assert_eq!(json["samples"], 2);
}
