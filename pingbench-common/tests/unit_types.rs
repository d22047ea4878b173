use pingbench_common::{PingMessage, RpcShape, StatsSnapshot};

#[test]
fn test_shape_display_matches_serialized_name() {
    for shape in RpcShape::ALL {
        let json = serde_json::to_string(&shape).unwrap();
        assert_eq!(json, format!("\"{}\"", shape));
        assert_eq!(shape.to_string(), shape.as_name());
    }
}

#[test]
fn test_shape_serializes_kebab_case() {
    let json = serde_json::to_string(&RpcShape::ClientStream).unwrap();
    assert_eq!(json, "\"client-stream\"");
}

#[test]
fn test_ping_message_json_shape() {
    let msg = PingMessage::new("ping");
    let json = serde_json::to_string(&msg).unwrap();
    assert_eq!(json, r#"{"message":"ping"}"#);
    let back: PingMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_stats_snapshot_default_is_zero() {
    let snapshot = StatsSnapshot::default();
    assert_eq!(snapshot.total_requests, 0);
    assert_eq!(snapshot.failed_requests, 0);
    assert_eq!(snapshot.avg_latency_sec, 0.0);
}
