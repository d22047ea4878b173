use pingbench_common::{PingBenchError, PingChannel, PingMessage, Result, RpcShape};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

use crate::config::BenchmarkConfig;
use crate::metrics::{saturating_millis, LatencyRecorder};
use crate::report::BenchmarkReport;

/// Drive `channel` with `config`, one task per unit of concurrency.
///
/// Every worker is joined before the recorder is read, so the report always
/// covers exactly the iterations that completed.
pub async fn run<C: PingChannel>(channel: Arc<C>, config: BenchmarkConfig) -> Result<BenchmarkReport> {
    config.validate()?;

    let per_worker = config.requests_per_worker();
    let dropped = config.total_requests - config.effective_requests();
    if dropped > 0 {
        warn!(
            total = config.total_requests,
            concurrency = config.concurrency,
            dropped,
            "total requests not divisible by concurrency; remainder is not issued"
        );
    }
    info!(
        shape = %config.shape,
        scenario = %config.scenario,
        workers = config.concurrency,
        per_worker,
        "benchmark starting"
    );

    let recorder = Arc::new(LatencyRecorder::with_capacity(config.effective_requests()));
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let run_start = Instant::now();

    let handles: Vec<JoinHandle<()>> = (0..config.concurrency)
        .map(|worker_id| {
            let rng = StdRng::seed_from_u64(base_seed.wrapping_add(worker_id as u64));
            tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&channel),
                Arc::clone(&recorder),
                config,
                rng,
            ))
        })
        .collect();

    for (worker_id, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            error!(worker_id, error = %e, "worker aborted");
        }
    }
    let elapsed = run_start.elapsed();

    // All workers are joined, so this is the last reference.
    let results = match Arc::try_unwrap(recorder) {
        Ok(recorder) => recorder.into_results(),
        Err(_) => {
            return Err(PingBenchError::TaskFailed(
                "latency recorder still shared after join".to_string(),
            ))
        }
    };

    let report = BenchmarkReport::new(&config, results, elapsed);
    info!(
        shape = %config.shape,
        successes = report.successes,
        failures = report.failures,
        "benchmark finished"
    );
    Ok(report)
}

async fn run_worker<C: PingChannel>(
    worker_id: usize,
    channel: Arc<C>,
    recorder: Arc<LatencyRecorder>,
    config: BenchmarkConfig,
    mut rng: StdRng,
) {
    for iteration in 0..config.requests_per_worker() {
        let started = Instant::now();
        let call = invoke(channel.as_ref(), config.shape, iteration);
        let outcome = match config.call_timeout {
            Some(limit) => timeout(limit, call)
                .await
                .unwrap_or(Err(PingBenchError::Timeout(saturating_millis(limit)))),
            None => call.await,
        };
        let latency = started.elapsed();

        match &outcome {
            Ok(()) => trace!(worker_id, iteration, ?latency, "call succeeded"),
            Err(e) => debug!(worker_id, iteration, error = %e, "call failed"),
        }
        recorder.record(latency, outcome.is_ok());

        let pause = config.scenario.pace(&mut rng);
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }
}

/// Perform one iteration of `shape` against `channel`.
///
/// `Ok(())` means the exchange completed at the transport level; inline
/// `"error: "` replies on a bidirectional stream still count as success.
pub async fn invoke<C: PingChannel>(channel: &C, shape: RpcShape, iteration: usize) -> Result<()> {
    match shape {
        RpcShape::Unary => {
            let reply = channel.ping(PingMessage::new("ping")).await?;
            trace!(message = %reply.message, "ping reply");
            Ok(())
        }
        RpcShape::ClientStream => {
            let stream = channel.open_client_stream().await?;
            stream
                .send(PingMessage::new(format!("aggregate ping #{}", iteration + 1)))
                .await?;
            let reply = stream.close_and_recv().await?;
            trace!(message = %reply.message, "aggregate reply");
            Ok(())
        }
        RpcShape::ServerStream => {
            let mut stream = channel.push_notifications(PingMessage::new("start")).await?;
            while let Some(notification) = stream.message().await? {
                trace!(message = %notification.message, "notification");
            }
            Ok(())
        }
        RpcShape::BidiStream => bidi_round_trip(channel, iteration).await,
    }
}

/// Send exactly one message on a fresh stream and wait until the receiver
/// has seen the stream end.
async fn bidi_round_trip<C: PingChannel>(channel: &C, iteration: usize) -> Result<()> {
    let (mut sender, mut receiver) = channel.open_bidi_stream().await?.split();

    let drain = tokio::spawn(async move {
        while let Some(reply) = receiver.message().await? {
            trace!(message = %reply.message, "stream ping reply");
        }
        Ok::<(), PingBenchError>(())
    });

    let sent = sender
        .send(PingMessage::new(format!("stream ping #{}", iteration + 1)))
        .await;
    sender.close_send();

    let drained = drain
        .await
        .map_err(|e| PingBenchError::TaskFailed(e.to_string()))?;
    sent?;
    drained
}
