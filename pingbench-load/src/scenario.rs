use clap::ValueEnum;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Inter-request pacing applied by every worker after each iteration.
///
/// | Scenario | Pause                       |
/// |----------|-----------------------------|
/// | Light    | 100 ms                      |
/// | Peak     | uniform whole ms in [0, 10) |
/// | Constant | none                        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoadScenario {
    Light,
    Peak,
    Constant,
}

pub const LIGHT_PAUSE: Duration = Duration::from_millis(100);
pub const PEAK_MAX_PAUSE_MS: u64 = 10;

impl LoadScenario {
    /// Draw the pause before the next iteration using `rng`.
    pub fn pace(&self, rng: &mut impl Rng) -> Duration {
        match self {
            LoadScenario::Light => LIGHT_PAUSE,
            LoadScenario::Peak => Duration::from_millis(rng.gen_range(0..PEAK_MAX_PAUSE_MS)),
            LoadScenario::Constant => Duration::ZERO,
        }
    }
}

impl fmt::Display for LoadScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}
