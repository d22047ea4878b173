use pingbench_common::{RpcShape, StatsSnapshot};
use serde::Serialize;
use std::time::Duration;

use crate::config::BenchmarkConfig;
use crate::metrics::{as_millis, saturating_millis, Percentiles, RunResults};
use crate::scenario::LoadScenario;

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub shape: RpcShape,
    pub scenario: LoadScenario,
    /// Requests asked for on the command line.
    pub requested: usize,
    /// Requests actually issued after dividing among workers.
    pub issued: usize,
    pub successes: u64,
    pub failures: u64,
    /// Latency samples recorded; one per completed iteration.
    pub samples: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub requests_per_second: f64,
    pub latency: Percentiles,
}

impl BenchmarkReport {
    pub fn new(config: &BenchmarkConfig, results: RunResults, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let requests_per_second = if secs > 0.0 { results.successes as f64 / secs } else { 0.0 };
        Self {
            shape: config.shape,
            scenario: config.scenario,
            requested: config.total_requests,
            issued: config.effective_requests(),
            successes: results.successes,
            failures: results.failures,
            samples: results.samples.len(),
            elapsed,
            requests_per_second,
            latency: results.percentiles(),
        }
    }

    pub fn completed(&self) -> u64 {
        self.successes + self.failures
    }
}

pub fn print_report(report: &BenchmarkReport) {
    println!("PingBench {} ({} load)", report.shape, report.scenario);
    println!("==========================================");
    println!("Requests:              {} issued of {} requested", report.issued, report.requested);
    println!("Succeeded:             {}", report.successes);
    println!("Failed:                {}", report.failures);
    println!("Total time:            {}", humantime::format_duration(truncate_to_millis(report.elapsed)));
    println!("Throughput:            {:.2} rps", report.requests_per_second);
    println!("P50 latency:           {:.3} ms", ms(report.latency.p50));
    println!("P90 latency:           {:.3} ms", ms(report.latency.p90));
    println!("P99 latency:           {:.3} ms", ms(report.latency.p99));
    println!();
}

pub fn print_server_stats(stats: &StatsSnapshot) {
    println!("Endpoint statistics");
    println!("===================");
    println!("Processed requests:    {}", stats.total_requests);
    println!("Failed requests:       {}", stats.failed_requests);
    println!("Average latency:       {:.6} s", stats.avg_latency_sec);
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn truncate_to_millis(d: Duration) -> Duration {
    Duration::from_millis(saturating_millis(d))
}
