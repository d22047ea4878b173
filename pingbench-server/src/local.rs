//! In-process `PingChannel`: every call or stream runs its handler on a
//! freshly spawned task, as a network server would.

use pingbench_common::{
    message_channel, BidiStream, ClientStream, MessageSender, MessageStream, PingBenchError,
    PingChannel, PingMessage, Result, StatsSnapshot,
};
use tokio::sync::oneshot;
use tracing::warn;

use crate::service::BenchmarkService;

#[derive(Clone)]
pub struct LocalChannel {
    service: BenchmarkService,
}

impl LocalChannel {
    pub fn new(service: BenchmarkService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &BenchmarkService {
        &self.service
    }
}

/// Hand a handler error to the client end of a stream, unless that end is gone.
async fn forward_error(outbound: &MessageSender, handler: &str, err: PingBenchError) {
    warn!(handler, error = %err, "stream handler failed");
    if err != PingBenchError::StreamClosed {
        outbound.send(Err(err)).await.ok();
    }
}

impl PingChannel for LocalChannel {
    async fn ping(&self, request: PingMessage) -> Result<PingMessage> {
        let service = self.service.clone();
        tokio::spawn(async move { service.ping(request).await })
            .await
            .map_err(|e| PingBenchError::TaskFailed(e.to_string()))?
    }

    async fn open_client_stream(&self) -> Result<ClientStream> {
        let (requests, inbound) = message_channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        let service = self.service.clone();
        tokio::spawn(async move {
            let result = service.aggregate_ping(inbound).await;
            if let Err(e) = &result {
                warn!(handler = "aggregate_ping", error = %e, "stream handler failed");
            }
            reply_tx.send(result).ok();
        });
        Ok(ClientStream::new(requests, reply_rx))
    }

    async fn push_notifications(&self, start: PingMessage) -> Result<MessageStream> {
        let (outbound, responses) = message_channel();
        let service = self.service.clone();
        tokio::spawn(async move {
            if let Err(e) = service.push_notifications(start, &outbound).await {
                forward_error(&outbound, "push_notifications", e).await;
            }
        });
        Ok(MessageStream::new(responses))
    }

    async fn open_bidi_stream(&self) -> Result<BidiStream> {
        let (requests, inbound) = message_channel();
        let (outbound, responses) = message_channel();
        let service = self.service.clone();
        tokio::spawn(async move {
            if let Err(e) = service.stream_ping(inbound, &outbound).await {
                forward_error(&outbound, "stream_ping", e).await;
            }
        });
        Ok(BidiStream::new(requests, MessageStream::new(responses)))
    }

    async fn stats(&self) -> Result<StatsSnapshot> {
        Ok(self.service.stats())
    }
}
