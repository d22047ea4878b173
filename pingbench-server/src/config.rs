use std::ops::Range;
use std::time::Duration;

/// Address the standalone server binds to unless told otherwise.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:50051";

/// Bounds (inclusive, milliseconds) of the simulated processing delay.
pub const DEFAULT_MIN_DELAY_MS: u64 = 1;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5;

/// Probability that a simulated request fails.
pub const DEFAULT_FAILURE_RATE: f64 = 0.02;

/// Number of messages a server stream emits per start message.
pub const NOTIFICATION_COUNT: usize = 5;

/// Delay before each server-stream message (milliseconds, half-open).
pub const NOTIFICATION_DELAY_MS: Range<u64> = 50..100;

/// Processing time of the non-simulated unary handler.
pub const DEFAULT_FIXED_UNARY_DELAY: Duration = Duration::from_millis(5);
