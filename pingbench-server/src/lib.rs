use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pingbench_common::ndjson::{encode_line, LineDecoder};
use pingbench_common::{message_channel, ErrorResponse, PingBenchError, PingMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

pub mod config;
pub mod local;
pub mod service;
pub mod simulate;
pub mod stats;

pub use local::LocalChannel;
pub use service::{BenchmarkService, UnaryMode};
pub use simulate::{RequestSimulator, Simulated, SimulatorConfig};
pub use stats::StatsAggregator;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Clone)]
pub struct AppState {
    pub service: BenchmarkService,
}

impl AppState {
    pub fn new(service: BenchmarkService) -> Self {
        Self { service }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub simulator: SimulatorConfig,
    /// Seed for the simulator; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub unary_mode: UnaryMode,
}

impl ServerConfig {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            simulator: SimulatorConfig::default(),
            seed: None,
            unary_mode: UnaryMode::Simulated,
        }
    }

    /// Build a service with a fresh stats aggregator and simulator.
    pub fn build_service(&self) -> BenchmarkService {
        let simulator = match self.seed {
            Some(seed) => RequestSimulator::new(self.simulator, seed),
            None => RequestSimulator::from_entropy(self.simulator),
        };
        BenchmarkService::new(Arc::new(StatsAggregator::new()), Arc::new(simulator))
            .with_unary_mode(self.unary_mode)
    }
}

/// PingBench HTTP endpoint
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router with the given state
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/ping", post(handle_ping))
            .route("/aggregate", post(handle_aggregate))
            .route("/push", post(handle_push))
            .route("/stats", get(handle_stats))
            .layer(middleware::from_fn(log_rpc))
            .with_state(state)
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(
        self,
        ready_tx: tokio::sync::oneshot::Sender<SocketAddr>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let state = AppState::new(self.config.build_service());
        let app = Self::create_router(state);
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "ping endpoint listening");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

fn status_for(err: &PingBenchError) -> StatusCode {
    match err {
        PingBenchError::Decode(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Logs method, path, status and duration of every call.
///
/// For streamed responses the duration ends at the response head; `/push`
/// logs the full stream duration from its producer task.
async fn log_rpc(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();
    let status = response.status();
    if status.is_server_error() {
        error!(%method, %path, %status, ?elapsed, "rpc failed");
    } else {
        debug!(%method, %path, %status, ?elapsed, "rpc succeeded");
    }
    response
}

/// Handler for POST /ping: echoes the message, or 500 on a simulated failure.
pub async fn handle_ping(State(state): State<AppState>, Json(request): Json<PingMessage>) -> Response {
    match state.service.ping(request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

/// Handler for POST /aggregate: consumes an NDJSON request body as a client stream.
pub async fn handle_aggregate(State(state): State<AppState>, body: Body) -> Response {
    let (requests, inbound) = message_channel();

    tokio::spawn(async move {
        let mut chunks = body.into_data_stream();
        let mut decoder = LineDecoder::new();
        while let Some(chunk) = chunks.next().await {
            let items = match chunk {
                Ok(bytes) => decoder.push(&bytes),
                Err(e) => vec![Err(PingBenchError::NetworkError(e.to_string()))],
            };
            for item in items {
                let failed = item.is_err();
                if requests.send(item).await.is_err() || failed {
                    return;
                }
            }
        }
        if let Some(item) = decoder.finish() {
            requests.send(item).await.ok();
        }
    });

    match state.service.aggregate_ping(inbound).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

/// Handler for POST /push: streams five notifications back as NDJSON lines.
pub async fn handle_push(State(state): State<AppState>, Json(start): Json<PingMessage>) -> Response {
    let (outbound, responses) = message_channel();
    let service = state.service.clone();
    tokio::spawn(async move {
        let started = Instant::now();
        match service.push_notifications(start, &outbound).await {
            Ok(()) => debug!(
                handler = "push_notifications",
                elapsed = ?started.elapsed(),
                "stream completed"
            ),
            Err(e) => warn!(
                handler = "push_notifications",
                error = %e,
                elapsed = ?started.elapsed(),
                "stream handler failed"
            ),
        }
    });

    let lines = ReceiverStream::new(responses).map(|item| {
        item.and_then(|message| encode_line(&message))
            .map(Bytes::from)
            .map_err(std::io::Error::other)
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(lines),
    )
        .into_response()
}

/// Handler for GET /stats: the aggregated service-side statistics.
pub async fn handle_stats(State(state): State<AppState>) -> Response {
    Json(state.service.stats()).into_response()
}
