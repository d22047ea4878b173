use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod channel;
pub mod ndjson;

pub use channel::{
    message_channel, BidiSender, BidiStream, ClientStream, MessageReceiver, MessageSender,
    MessageStream, PingChannel, STREAM_BUFFER,
};

/// Text payload carried in both directions by every interaction shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingMessage {
    pub message: String,
}

impl PingMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Server-side statistics as reported by the stats query.
///
/// `total_requests` and `avg_latency_sec` only reflect successfully processed
/// requests; simulated failures are counted in `failed_requests` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_requests: i32,
    pub failed_requests: i32,
    pub avg_latency_sec: f64,
}

/// The four RPC interaction shapes a benchmark run can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RpcShape {
    /// One request, one response.
    Unary,
    /// Many requests, one aggregated response.
    ClientStream,
    /// One request, many responses.
    ServerStream,
    /// Independent request and response flows over one stream.
    BidiStream,
}

impl RpcShape {
    pub const ALL: [RpcShape; 4] = [
        RpcShape::Unary,
        RpcShape::ClientStream,
        RpcShape::ServerStream,
        RpcShape::BidiStream,
    ];

    /// Display name, identical to the serialized form.
    pub fn as_name(&self) -> &'static str {
        match self {
            RpcShape::Unary => "unary",
            RpcShape::ClientStream => "client-stream",
            RpcShape::ServerStream => "server-stream",
            RpcShape::BidiStream => "bidi-stream",
        }
    }
}

impl fmt::Display for RpcShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_name())
    }
}

/// Error types for PingBench operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PingBenchError {
    #[error("simulated server error")]
    Simulated,

    #[error("Call timed out after {0} ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("Stream closed by peer")]
    StreamClosed,

    #[error("Malformed message: {0}")]
    Decode(String),

    #[error("Stream task failed: {0}")]
    TaskFailed(String),

    #[error("Interaction shape {0} is not supported by this channel")]
    Unsupported(RpcShape),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// JSON error envelope returned by the server for all error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for PingBench operations
pub type Result<T> = std::result::Result<T, PingBenchError>;
