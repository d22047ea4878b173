//! Request handlers for the four interaction shapes and the stats query.
//!
//! Handlers are transport-agnostic: streams arrive as `MessageReceiver`s
//! (closed sender = peer closed its side) and leave through `MessageSender`s.

use pingbench_common::{
    MessageReceiver, MessageSender, PingBenchError, PingMessage, Result, StatsSnapshot,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::config::NOTIFICATION_COUNT;
use crate::simulate::RequestSimulator;
use crate::stats::StatsAggregator;

/// How the unary handler processes a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryMode {
    /// Random delay and random failure from the simulator.
    Simulated,
    /// Fixed processing time, never fails; the measured time is recorded.
    Fixed(Duration),
}

#[derive(Clone)]
pub struct BenchmarkService {
    stats: Arc<StatsAggregator>,
    simulator: Arc<RequestSimulator>,
    unary_mode: UnaryMode,
}

impl BenchmarkService {
    pub fn new(stats: Arc<StatsAggregator>, simulator: Arc<RequestSimulator>) -> Self {
        Self { stats, simulator, unary_mode: UnaryMode::Simulated }
    }

    pub fn with_unary_mode(mut self, unary_mode: UnaryMode) -> Self {
        self.unary_mode = unary_mode;
        self
    }

    pub fn stats_aggregator(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    /// Unary: echo the request back unchanged, or fail with `Simulated`.
    pub async fn ping(&self, request: PingMessage) -> Result<PingMessage> {
        trace!(message = %request.message, "ping received");
        match self.unary_mode {
            UnaryMode::Simulated => {
                let simulated = self.simulator.simulate().await;
                match simulated.into_result() {
                    Ok(delay) => self.stats.record_success(delay),
                    Err(e) => {
                        self.stats.record_failure();
                        return Err(e);
                    }
                }
            }
            UnaryMode::Fixed(processing) => {
                let start = Instant::now();
                tokio::time::sleep(processing).await;
                self.stats.record_success(start.elapsed());
            }
        }
        Ok(request)
    }

    /// Bidirectional stream: one reply per request until the peer closes.
    ///
    /// Simulated failures are reported inline as `"error: <m>"` instead of
    /// terminating the stream.
    pub async fn stream_ping(
        &self,
        mut inbound: MessageReceiver,
        outbound: &MessageSender,
    ) -> Result<()> {
        while let Some(request) = inbound.recv().await {
            let request = request?;
            let reply = match self.simulator.simulate().await.into_result() {
                Ok(delay) => {
                    self.stats.record_success(delay);
                    format!("echo: {}", request.message)
                }
                Err(_) => {
                    self.stats.record_failure();
                    format!("error: {}", request.message)
                }
            };
            outbound
                .send(Ok(PingMessage::new(reply)))
                .await
                .map_err(|_| PingBenchError::StreamClosed)?;
            debug!(message = %request.message, "stream ping processed");
        }
        Ok(())
    }

    /// Server stream: `"<start> #1"` through `"<start> #5"`, each after a random pause.
    pub async fn push_notifications(
        &self,
        start: PingMessage,
        outbound: &MessageSender,
    ) -> Result<()> {
        for i in 1..=NOTIFICATION_COUNT {
            tokio::time::sleep(self.simulator.notification_delay()).await;
            let notification = PingMessage::new(format!("{} #{}", start.message, i));
            debug!(message = %notification.message, "notification sent");
            outbound
                .send(Ok(notification))
                .await
                .map_err(|_| PingBenchError::StreamClosed)?;
        }
        Ok(())
    }

    /// Client stream: concatenate every message, reply once the peer closes.
    ///
    /// Failed simulations still count toward the message tally.
    pub async fn aggregate_ping(&self, mut inbound: MessageReceiver) -> Result<PingMessage> {
        let mut count = 0usize;
        let mut log = String::new();
        while let Some(request) = inbound.recv().await {
            let request = request?;
            count += 1;
            log.push_str(&request.message);
            log.push_str(" | ");

            match self.simulator.simulate().await.into_result() {
                Ok(delay) => self.stats.record_success(delay),
                Err(_) => self.stats.record_failure(),
            }
            trace!(message = %request.message, "aggregate message received");
        }
        let response = format!("Aggregated {count} messages: {log}");
        debug!(%response, "aggregate ping done");
        Ok(PingMessage::new(response))
    }

    pub fn stats(&self) -> StatsSnapshot {
        let snapshot = self.stats.snapshot();
        debug!(
            total = snapshot.total_requests,
            failed = snapshot.failed_requests,
            avg = snapshot.avg_latency_sec,
            "stats requested"
        );
        snapshot
    }
}
