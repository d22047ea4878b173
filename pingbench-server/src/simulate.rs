use pingbench_common::{PingBenchError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::{
    DEFAULT_FAILURE_RATE, DEFAULT_MAX_DELAY_MS, DEFAULT_MIN_DELAY_MS, NOTIFICATION_DELAY_MS,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Probability in `[0, 1]` that a request fails.
    pub failure_rate: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            failure_rate: DEFAULT_FAILURE_RATE,
        }
    }
}

/// Outcome of one simulated processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulated {
    pub delay: Duration,
    pub failed: bool,
}

impl Simulated {
    /// `Ok(delay)` on success, `Err(Simulated)` on an injected failure.
    pub fn into_result(self) -> Result<Duration> {
        if self.failed {
            Err(PingBenchError::Simulated)
        } else {
            Ok(self.delay)
        }
    }
}

/// Injects random processing delay and random failures.
///
/// Delay and failure are independent draws from one seeded generator.
pub struct RequestSimulator {
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
}

impl RequestSimulator {
    pub fn new(config: SimulatorConfig, seed: u64) -> Self {
        Self { config, rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    pub fn from_entropy(config: SimulatorConfig) -> Self {
        Self { config, rng: Mutex::new(StdRng::from_entropy()) }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw a delay and a failure outcome without sleeping.
    pub fn draw(&self) -> Simulated {
        let min = self.config.min_delay_ms;
        let max = self.config.max_delay_ms.max(min);
        let mut rng = self.rng();
        let delay = Duration::from_millis(rng.gen_range(min..=max));
        let failed = rng.gen::<f64>() < self.config.failure_rate;
        Simulated { delay, failed }
    }

    /// Draw, then sleep for the full delay whether or not the request failed.
    pub async fn simulate(&self) -> Simulated {
        let simulated = self.draw();
        tokio::time::sleep(simulated.delay).await;
        simulated
    }

    /// Pause before each server-stream message.
    pub fn notification_delay(&self) -> Duration {
        Duration::from_millis(self.rng().gen_range(NOTIFICATION_DELAY_MS))
    }
}
