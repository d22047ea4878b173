use serde::{Serialize, Serializer};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One completed iteration as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySample {
    pub latency: Duration,
    pub success: bool,
}

/// Everything recorded during a run, in insertion order (unsorted).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResults {
    pub samples: Vec<LatencySample>,
    pub successes: u64,
    pub failures: u64,
}

impl RunResults {
    pub fn completed(&self) -> u64 {
        self.successes + self.failures
    }

    /// Percentiles over every sample, successful or not.
    pub fn percentiles(&self) -> Percentiles {
        Percentiles::from_latencies(self.samples.iter().map(|s| s.latency).collect())
    }
}

/// Shared sink for worker results. One lock guards samples and tallies together.
#[derive(Debug, Default)]
pub struct LatencyRecorder {
    inner: Mutex<RunResults>,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RunResults {
                samples: Vec::with_capacity(capacity),
                ..RunResults::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunResults> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, latency: Duration, success: bool) {
        let mut results = self.lock();
        results.samples.push(LatencySample { latency, success });
        if success {
            results.successes += 1;
        } else {
            results.failures += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the recorder. Requires sole ownership, so no writer can remain.
    pub fn into_results(self) -> RunResults {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Nearest-rank tail latencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Percentiles {
    #[serde(rename = "p50_ms", serialize_with = "as_millis")]
    pub p50: Duration,
    #[serde(rename = "p90_ms", serialize_with = "as_millis")]
    pub p90: Duration,
    #[serde(rename = "p99_ms", serialize_with = "as_millis")]
    pub p99: Duration,
}

impl Percentiles {
    /// Sort `latencies` ascending and pick p50/p90/p99. All zero when empty.
    pub fn from_latencies(mut latencies: Vec<Duration>) -> Self {
        latencies.sort_unstable();
        Self {
            p50: nearest_rank(&latencies, 50),
            p90: nearest_rank(&latencies, 90),
            p99: nearest_rank(&latencies, 99),
        }
    }
}

/// Sort a copy of `data` ascending and return the element at index
/// `floor(len * p / 100)`, clamped to the last element.
/// Returns zero for an empty slice.
pub fn percentile(data: &[Duration], p: usize) -> Duration {
    let mut sorted = data.to_vec();
    sorted.sort_unstable();
    nearest_rank(&sorted, p)
}

fn nearest_rank(sorted: &[Duration], p: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = sorted.len() * p / 100;
    sorted[idx.min(sorted.len() - 1)]
}

pub(crate) fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
