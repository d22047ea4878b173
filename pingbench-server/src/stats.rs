use pingbench_common::StatsSnapshot;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Counters {
    req_count: u64,
    fail_count: u64,
    total_time: Duration,
}

/// Service-side request statistics shared by every handler.
///
/// All three operations take the same lock; it is never held across an await.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    counters: Mutex<Counters>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked mid-update.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one successfully processed request that took `delay`.
    pub fn record_success(&self, delay: Duration) {
        let mut counters = self.lock();
        counters.req_count += 1;
        counters.total_time += delay;
    }

    /// Count one failed request. Does not affect the average latency.
    pub fn record_failure(&self) {
        self.lock().fail_count += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.lock();
        let avg_latency_sec = if counters.req_count > 0 {
            counters.total_time.as_secs_f64() / counters.req_count as f64
        } else {
            0.0
        };
        StatsSnapshot {
            total_requests: saturating_i32(counters.req_count),
            failed_requests: saturating_i32(counters.fail_count),
            avg_latency_sec,
        }
    }
}

fn saturating_i32(count: u64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
