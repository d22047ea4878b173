//! The abstract RPC channel the benchmark drives, and the stream handles it
//! hands out.
//!
//! Every stream is a pair of bounded `mpsc` queues carrying
//! `Result<PingMessage>`. Dropping the sending half is how a peer closes its
//! side; an `Err` item carries a transport error to the other end.

use std::future::Future;
use tokio::sync::{mpsc, oneshot};

use crate::{PingBenchError, PingMessage, Result, RpcShape, StatsSnapshot};

/// Capacity of every in-flight message queue.
pub const STREAM_BUFFER: usize = 32;

pub type MessageSender = mpsc::Sender<Result<PingMessage>>;
pub type MessageReceiver = mpsc::Receiver<Result<PingMessage>>;

pub fn message_channel() -> (MessageSender, MessageReceiver) {
    mpsc::channel(STREAM_BUFFER)
}

/// A connection to a ping endpoint supporting the four interaction shapes
/// plus the stats query.
pub trait PingChannel: Send + Sync + 'static {
    /// Unary call: one request, one response.
    fn ping(&self, request: PingMessage) -> impl Future<Output = Result<PingMessage>> + Send;

    /// Open a client stream; the reply arrives after the send side is closed.
    fn open_client_stream(&self) -> impl Future<Output = Result<ClientStream>> + Send;

    /// Server stream: one start message, a sequence of responses.
    fn push_notifications(
        &self,
        start: PingMessage,
    ) -> impl Future<Output = Result<MessageStream>> + Send;

    /// Open a bidirectional stream.
    fn open_bidi_stream(&self) -> impl Future<Output = Result<BidiStream>> + Send;

    /// Query the endpoint's aggregated statistics.
    fn stats(&self) -> impl Future<Output = Result<StatsSnapshot>> + Send;

    /// Whether this channel can carry `shape` at all.
    fn supports(&self, _shape: RpcShape) -> bool {
        true
    }
}

/// Client side of a client-streaming call.
pub struct ClientStream {
    requests: MessageSender,
    reply: oneshot::Receiver<Result<PingMessage>>,
}

impl ClientStream {
    pub fn new(requests: MessageSender, reply: oneshot::Receiver<Result<PingMessage>>) -> Self {
        Self { requests, reply }
    }

    pub async fn send(&self, message: PingMessage) -> Result<()> {
        self.requests
            .send(Ok(message))
            .await
            .map_err(|_| PingBenchError::StreamClosed)
    }

    /// Close the send side and wait for the single aggregated response.
    pub async fn close_and_recv(self) -> Result<PingMessage> {
        drop(self.requests);
        self.reply.await.map_err(|_| PingBenchError::StreamClosed)?
    }
}

/// Receiving half of a stream: server-stream responses or bidi replies.
pub struct MessageStream {
    responses: MessageReceiver,
}

impl MessageStream {
    pub fn new(responses: MessageReceiver) -> Self {
        Self { responses }
    }

    /// Next message, or `Ok(None)` once the peer has closed the stream cleanly.
    pub async fn message(&mut self) -> Result<Option<PingMessage>> {
        match self.responses.recv().await {
            None => Ok(None),
            Some(item) => item.map(Some),
        }
    }
}

/// Sending half of a bidirectional stream.
pub struct BidiSender {
    requests: Option<MessageSender>,
}

impl BidiSender {
    pub async fn send(&self, message: PingMessage) -> Result<()> {
        let requests = self.requests.as_ref().ok_or(PingBenchError::StreamClosed)?;
        requests
            .send(Ok(message))
            .await
            .map_err(|_| PingBenchError::StreamClosed)
    }

    /// Close the send side. Further sends fail with `StreamClosed`.
    pub fn close_send(&mut self) {
        self.requests.take();
    }
}

/// Both halves of a bidirectional stream.
pub struct BidiStream {
    sender: BidiSender,
    receiver: MessageStream,
}

impl BidiStream {
    pub fn new(requests: MessageSender, responses: MessageStream) -> Self {
        Self {
            sender: BidiSender { requests: Some(requests) },
            receiver: responses,
        }
    }

    /// Split into halves so sends and receives can run on different tasks.
    pub fn split(self) -> (BidiSender, MessageStream) {
        (self.sender, self.receiver)
    }
}
