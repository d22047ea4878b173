use pingbench_common::ndjson::{encode_line, LineDecoder};
use pingbench_common::{
    message_channel, BidiStream, ClientStream, ErrorResponse, MessageSender, MessageStream,
    PingBenchError, PingChannel, PingMessage, Result, RpcShape, StatsSnapshot,
};
use tokio::sync::oneshot;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

/// PingBench client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint base URL, e.g. `http://127.0.0.1:50051`.
    pub base_url: String,
}

/// `PingChannel` over the endpoint's HTTP surface.
///
/// Client and server streams are carried as NDJSON bodies. Bidirectional
/// streaming has no HTTP mapping and is reported as unsupported.
pub struct HttpChannel {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl HttpChannel {
    /// Create a new channel with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self { config, http_client: reqwest::Client::new() }
    }

    /// Build the URL for an endpoint route.
    pub fn build_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

fn network_error(e: reqwest::Error) -> PingBenchError {
    PingBenchError::NetworkError(e.to_string())
}

fn decode_error(e: reqwest::Error) -> PingBenchError {
    PingBenchError::Decode(e.to_string())
}

async fn parse_error_response(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> PingBenchError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    PingBenchError::HttpError(status.as_u16(), error_msg)
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(parse_error_response(status, response).await);
    }
    Ok(response)
}

/// Forward every NDJSON line of `response` into `outbound` until the body ends.
async fn relay_lines(response: reqwest::Response, outbound: MessageSender) {
    let mut chunks = response.bytes_stream();
    let mut decoder = LineDecoder::new();
    while let Some(chunk) = chunks.next().await {
        let items = match chunk {
            Ok(bytes) => decoder.push(&bytes),
            Err(e) => vec![Err(network_error(e))],
        };
        for item in items {
            let failed = item.is_err();
            if outbound.send(item).await.is_err() || failed {
                return;
            }
        }
    }
    if let Some(item) = decoder.finish() {
        outbound.send(item).await.ok();
    }
}

impl PingChannel for HttpChannel {
    async fn ping(&self, request: PingMessage) -> Result<PingMessage> {
        let response = self
            .http_client
            .post(self.build_url("ping"))
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        expect_success(response)
            .await?
            .json::<PingMessage>()
            .await
            .map_err(decode_error)
    }

    async fn open_client_stream(&self) -> Result<ClientStream> {
        let (requests, outgoing) = message_channel();
        let (reply_tx, reply_rx) = oneshot::channel();

        let lines = ReceiverStream::new(outgoing)
            .map(|item| item.and_then(|message| encode_line(&message)));
        let request = self
            .http_client
            .post(self.build_url("aggregate"))
            .header("Content-Type", "application/x-ndjson")
            .body(reqwest::Body::wrap_stream(lines));

        tokio::spawn(async move {
            let result = match request.send().await {
                Ok(response) => match expect_success(response).await {
                    Ok(response) => response.json::<PingMessage>().await.map_err(decode_error),
                    Err(e) => Err(e),
                },
                Err(e) => Err(network_error(e)),
            };
            debug!(ok = result.is_ok(), "aggregate call finished");
            reply_tx.send(result).ok();
        });

        Ok(ClientStream::new(requests, reply_rx))
    }

    async fn push_notifications(&self, start: PingMessage) -> Result<MessageStream> {
        let response = self
            .http_client
            .post(self.build_url("push"))
            .json(&start)
            .send()
            .await
            .map_err(network_error)?;
        let response = expect_success(response).await?;

        let (outbound, responses) = message_channel();
        tokio::spawn(relay_lines(response, outbound));
        Ok(MessageStream::new(responses))
    }

    async fn open_bidi_stream(&self) -> Result<BidiStream> {
        Err(PingBenchError::Unsupported(RpcShape::BidiStream))
    }

    async fn stats(&self) -> Result<StatsSnapshot> {
        let response = self
            .http_client
            .get(self.build_url("stats"))
            .send()
            .await
            .map_err(network_error)?;

        let snapshot = expect_success(response)
            .await?
            .json::<StatsSnapshot>()
            .await
            .map_err(decode_error)?;
        trace!(?snapshot, "stats received");
        Ok(snapshot)
    }

    fn supports(&self, shape: RpcShape) -> bool {
        shape != RpcShape::BidiStream
    }
}
