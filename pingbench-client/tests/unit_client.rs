use pingbench_client::{ClientConfig, HttpChannel};
use pingbench_common::{PingBenchError, PingChannel, PingMessage, RpcShape};

// Helper: a channel aimed at the given mockito server URL.
fn channel_for(server_url: &str) -> HttpChannel {
    HttpChannel::new(ClientConfig { base_url: server_url.to_string() })
}

// Helper: a channel pointed at localhost:8080 for tests that never actually connect.
fn localhost_channel() -> HttpChannel {
    channel_for("http://127.0.0.1:8080")
}

#[test]
fn test_client_creation_with_config() {
    let channel = channel_for("http://example.com:3000");
    assert_eq!(channel.config.base_url, "http://example.com:3000");
}

#[test]
fn test_build_url() {
    let channel = localhost_channel();
    assert_eq!(channel.build_url("ping"), "http://127.0.0.1:8080/ping");
    assert_eq!(channel.build_url("/stats"), "http://127.0.0.1:8080/stats");
}

#[test]
fn test_build_url_trailing_slash_in_base() {
    let channel = channel_for("http://localhost:9000/");
    assert_eq!(channel.build_url("push"), "http://localhost:9000/push");
}

#[test]
fn test_bidi_is_not_supported_over_http() {
    let channel = localhost_channel();
    assert!(channel.supports(RpcShape::Unary));
    assert!(channel.supports(RpcShape::ClientStream));
    assert!(channel.supports(RpcShape::ServerStream));
    assert!(!channel.supports(RpcShape::BidiStream));
}

#[tokio::test]
async fn test_open_bidi_stream_returns_unsupported() {
    let channel = localhost_channel();
    assert!(matches!(
        channel.open_bidi_stream().await,
        Err(PingBenchError::Unsupported(RpcShape::BidiStream))
    ));
}

// --- ping ---

#[tokio::test]
async fn test_ping_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ping")
        .match_body(mockito::Matcher::JsonString(r#"{"message":"ping"}"#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"ping"}"#)
        .create_async()
        .await;

    let channel = channel_for(&server.url());
    let reply = channel.ping(PingMessage::new("ping")).await.unwrap();
    assert_eq!(reply.message, "ping");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ping_server_error_parses_error_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/ping")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"simulated server error"}"#)
        .create_async()
        .await;

    let channel = channel_for(&server.url());
    let result = channel.ping(PingMessage::new("ping")).await;
    assert_eq!(
        result,
        Err(PingBenchError::HttpError(500, "simulated server error".to_string()))
    );
}

#[tokio::test]
async fn test_ping_server_error_without_json_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/ping")
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let channel = channel_for(&server.url());
    match channel.ping(PingMessage::new("ping")).await {
        Err(PingBenchError::HttpError(503, msg)) => {
            assert!(msg.contains("503"), "unexpected message: {msg}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_ping_network_error() {
    // Port 1 is reserved and nothing listens on it.
    let channel = channel_for("http://127.0.0.1:1");
    assert!(matches!(
        channel.ping(PingMessage::new("ping")).await,
        Err(PingBenchError::NetworkError(_))
    ));
}

// --- push_notifications ---

#[tokio::test]
async fn test_push_notifications_decodes_ndjson_lines() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/push")
        .with_status(200)
        .with_header("content-type", "application/x-ndjson")
        .with_body("{\"message\":\"start #1\"}\n{\"message\":\"start #2\"}\n")
        .create_async()
        .await;

    let channel = channel_for(&server.url());
    let mut stream = channel.push_notifications(PingMessage::new("start")).await.unwrap();

    assert_eq!(stream.message().await.unwrap(), Some(PingMessage::new("start #1")));
    assert_eq!(stream.message().await.unwrap(), Some(PingMessage::new("start #2")));
    assert_eq!(stream.message().await.unwrap(), None);
}

#[tokio::test]
async fn test_push_notifications_malformed_line_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/push")
        .with_status(200)
        .with_body("garbage\n")
        .create_async()
        .await;

    let channel = channel_for(&server.url());
    let mut stream = channel.push_notifications(PingMessage::new("start")).await.unwrap();
    assert!(matches!(stream.message().await, Err(PingBenchError::Decode(_))));
}

// --- client stream ---

#[tokio::test]
async fn test_client_stream_posts_ndjson_and_returns_reply() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/aggregate")
        .match_body("{\"message\":\"a\"}\n{\"message\":\"b\"}\n")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Aggregated 2 messages: a | b | "}"#)
        .create_async()
        .await;

    let channel = channel_for(&server.url());
    let stream = channel.open_client_stream().await.unwrap();
    stream.send(PingMessage::new("a")).await.unwrap();
    stream.send(PingMessage::new("b")).await.unwrap();
    let reply = stream.close_and_recv().await.unwrap();

    assert_eq!(reply.message, "Aggregated 2 messages: a | b | ");
    mock.assert_async().await;
}

// --- stats ---

#[tokio::test]
async fn test_stats_parses_snapshot() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/stats")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total_requests":42,"failed_requests":1,"avg_latency_sec":0.003}"#)
        .create_async()
        .await;

    let channel = channel_for(&server.url());
    let snapshot = channel.stats().await.unwrap();
    assert_eq!(snapshot.total_requests, 42);
    assert_eq!(snapshot.failed_requests, 1);
    assert_eq!(snapshot.avg_latency_sec, 0.003);
}
