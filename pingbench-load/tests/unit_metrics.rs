use pingbench_load::metrics::{
    percentile, saturating_millis, LatencyRecorder, LatencySample, Percentiles,
};
use std::sync::Arc;
use std::time::Duration;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn test_percentiles_empty_returns_zero() {
    let p = Percentiles::from_latencies(vec![]);
    assert_eq!(p, Percentiles { p50: Duration::ZERO, p90: Duration::ZERO, p99: Duration::ZERO });
}

#[test]
fn test_percentiles_single_element() {
    let p = Percentiles::from_latencies(vec![ms(7)]);
    assert_eq!(p.p50, ms(7));
    assert_eq!(p.p90, ms(7));
    assert_eq!(p.p99, ms(7));
}

#[test]
fn test_percentiles_one_to_hundred_use_nearest_rank() {
    // index = floor(100 * p / 100) = p → element p+1
    let p = Percentiles::from_latencies((1..=100).map(ms).collect());
    assert_eq!(p.p50, ms(51));
    assert_eq!(p.p90, ms(91));
    assert_eq!(p.p99, ms(100));
}

#[test]
fn test_percentiles_unsorted_input() {
    // sorted: [100, 200, 300, 400, 500], n=5
    // p50: floor(5 * 50 / 100) = 2 → 300
    // p90: floor(5 * 90 / 100) = 4 → 500
    // p99: floor(5 * 99 / 100) = 4 → 500
    let p = Percentiles::from_latencies(vec![ms(500), ms(100), ms(300), ms(200), ms(400)]);
    assert_eq!(p.p50, ms(300));
    assert_eq!(p.p90, ms(500));
    assert_eq!(p.p99, ms(500));
}

#[test]
fn test_percentile_clamps_to_last_element() {
    let data = vec![ms(1), ms(2), ms(3)];
    assert_eq!(percentile(&data, 100), ms(3));
    assert_eq!(percentile(&data, 0), ms(1));
    assert_eq!(percentile(&[], 50), Duration::ZERO);
}

#[test]
fn test_recorder_tallies_successes_and_failures() {
    let recorder = LatencyRecorder::new();
    assert!(recorder.is_empty());

    recorder.record(ms(3), true);
    recorder.record(ms(1), false);
    recorder.record(ms(2), true);
    assert_eq!(recorder.len(), 3);

    let results = recorder.into_results();
    assert_eq!(results.successes, 2);
    assert_eq!(results.failures, 1);
    assert_eq!(results.completed(), 3);
    assert_eq!(
        results.samples,
        vec![
            LatencySample { latency: ms(3), success: true },
            LatencySample { latency: ms(1), success: false },
            LatencySample { latency: ms(2), success: true },
        ]
    );
    assert_eq!(results.percentiles().p50, ms(2));
}

#[test]
fn test_recorder_concurrent_writers_lose_nothing() {
    let recorder = Arc::new(LatencyRecorder::with_capacity(4_000));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let recorder = Arc::clone(&recorder);
            std::thread::spawn(move || {
                for i in 0..500 {
                    recorder.record(ms(i), (t + i) % 3 != 0);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let results = Arc::try_unwrap(recorder).unwrap().into_results();
    assert_eq!(results.samples.len(), 4_000);
    assert_eq!(results.completed(), 4_000);
}

#[test]
fn test_saturating_millis() {
    assert_eq!(saturating_millis(Duration::from_micros(1_500_900)), 1_500);
    assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
}
