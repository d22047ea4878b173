use clap::ValueEnum;
use pingbench_common::{PingBenchError, Result, RpcShape};
use std::time::Duration;

use crate::scenario::LoadScenario;

pub const DEFAULT_TOTAL_REQUESTS: usize = 1000;
pub const DEFAULT_CONCURRENCY: usize = 50;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Parameters of one benchmark run. Immutable once the run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkConfig {
    pub total_requests: usize,
    pub concurrency: usize,
    pub scenario: LoadScenario,
    pub shape: RpcShape,
    /// Upper bound on a single iteration; exceeding it counts as a failure.
    pub call_timeout: Option<Duration>,
    /// Base seed for the workers' pacing generators; random when `None`.
    pub seed: Option<u64>,
}

impl BenchmarkConfig {
    pub fn new(shape: RpcShape) -> Self {
        Self {
            total_requests: DEFAULT_TOTAL_REQUESTS,
            concurrency: DEFAULT_CONCURRENCY,
            scenario: LoadScenario::Constant,
            shape,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_requests == 0 {
            return Err(PingBenchError::InvalidConfig(
                "total requests must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(PingBenchError::InvalidConfig(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Iterations each worker runs. Any remainder of the division is dropped.
    pub fn requests_per_worker(&self) -> usize {
        self.total_requests / self.concurrency
    }

    /// Requests the run will actually issue.
    pub fn effective_requests(&self) -> usize {
        self.requests_per_worker() * self.concurrency
    }
}

/// Interaction shapes selectable on the command line; `all` runs each in turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeSelection {
    Unary,
    ClientStream,
    ServerStream,
    BidiStream,
    All,
}

impl ShapeSelection {
    pub fn shapes(self) -> Vec<RpcShape> {
        match self {
            ShapeSelection::Unary => vec![RpcShape::Unary],
            ShapeSelection::ClientStream => vec![RpcShape::ClientStream],
            ShapeSelection::ServerStream => vec![RpcShape::ServerStream],
            ShapeSelection::BidiStream => vec![RpcShape::BidiStream],
            ShapeSelection::All => RpcShape::ALL.to_vec(),
        }
    }
}
