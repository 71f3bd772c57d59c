//! Integration tests for `FeigReader` using wiremock.

use serde_json::json;
use std::time::Duration;
use tagbridge_hardware::{FeigReader, HardwareError, ReaderEventKind, RfidReader};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, FeigReader) {
    let server = MockServer::start().await;
    let reader = FeigReader::new(reqwest::Client::new(), &server.uri(), "Desk").unwrap();
    (server, reader)
}

async fn mount_inventory(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/inventory/Desk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Inventory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_inventory_decodes_tags() {
    let (server, reader) = setup().await;
    mount_inventory(
        &server,
        json!([
            { "id": "E2000001", "rssi": -48, "secured": true, "mediaId": "31234", "tagType": "DE290" },
            { "id": "E2000002", "rssi": -61 }
        ]),
    )
    .await;

    let tags = reader.inventory().await.unwrap();

    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].media_id.as_deref(), Some("31234"));
    assert_eq!(tags[1].secured, None);
}

#[tokio::test]
async fn test_inventory_accepts_wrapped_payload() {
    let (server, reader) = setup().await;
    mount_inventory(&server, json!({ "items": [{ "id": "E2000001" }] })).await;

    assert_eq!(reader.inventory().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_inventory_error_status() {
    let (server, reader) = setup().await;

    Mock::given(method("GET"))
        .and(path("/inventory/Desk"))
        .respond_with(ResponseTemplate::new(503).set_body_string("reader offline"))
        .mount(&server)
        .await;

    let result = reader.inventory().await;
    assert!(
        matches!(result, Err(HardwareError::HttpStatus { status: 503, .. })),
        "expected HttpStatus error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_inventory_invalid_json() {
    let (server, reader) = setup().await;

    Mock::given(method("GET"))
        .and(path("/inventory/Desk"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = reader.inventory().await;
    assert!(matches!(result, Err(HardwareError::InvalidData { .. })));
}

#[tokio::test]
async fn test_read_filters_inventory() {
    let (server, reader) = setup().await;
    mount_inventory(&server, json!([{ "id": "A" }, { "id": "B", "secured": false }])).await;

    let tag = reader.read("B").await.unwrap().unwrap();
    assert_eq!(tag.secured, Some(false));
    assert!(reader.read("C").await.unwrap().is_none());
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_edit_posts_epc_and_media_id() {
    let (server, reader) = setup().await;

    Mock::given(method("POST"))
        .and(path("/edit/Desk"))
        .and(body_json(json!({ "epc": "E1", "mediaId": "31234" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "mediaId": "31234",
            "oldEpc": "E1",
            "newEpc": "E2",
            "tagType": "DE290"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reader.edit("E1", "31234").await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.new_epc.as_deref(), Some("E2"));
}

#[tokio::test]
async fn test_negative_outcome_with_error_status_is_a_value() {
    let (server, reader) = setup().await;

    Mock::given(method("POST"))
        .and(path("/secure/Desk"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "success": false, "message": "Tag not found" })),
        )
        .mount(&server)
        .await;

    let outcome = reader.secure("E1").await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("Tag not found"));
}

#[tokio::test]
async fn test_undecodable_error_status_is_an_error() {
    let (server, reader) = setup().await;

    Mock::given(method("POST"))
        .and(path("/unsecure/Desk"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let result = reader.unsecure("E1").await;
    assert!(matches!(
        result,
        Err(HardwareError::HttpStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_kill_initialize_clear() {
    let (server, reader) = setup().await;

    Mock::given(method("POST"))
        .and(path("/kill/Desk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/initialize/Desk"))
        .and(body_json(json!({ "mediaId": "31234", "secured": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "epc": "E000000000000000000031234",
            "format": "DE290"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clear/Desk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "oldEpc": "E1",
            "newEpc": "E2801160AABB",
            "newPc": "3000"
        })))
        .mount(&server)
        .await;

    assert!(reader.kill("E1").await.unwrap());

    let initialized = reader.initialize("31234", None, Some(false)).await.unwrap();
    assert_eq!(
        initialized.epc.as_deref(),
        Some("E000000000000000000031234")
    );

    let cleared = reader.clear("E1").await.unwrap();
    assert_eq!(cleared.new_epc.as_deref(), Some("E2801160AABB"));
}

#[tokio::test]
async fn test_analyze_passes_epc_query() {
    let (server, reader) = setup().await;

    Mock::given(method("GET"))
        .and(path("/analyze/Desk"))
        .and(query_param("epc", "E1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "epc": "E1",
            "analysis": {
                "tagType": "DE290",
                "securityAssessment": { "properlySecured": false, "issues": ["EAS bit not set"] }
            }
        })))
        .mount(&server)
        .await;

    let outcome = reader.analyze("E1").await.unwrap();
    assert!(outcome.success);
    assert!(!outcome.properly_secured());
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_from_descriptor() {
    let (server, reader) = setup().await;

    Mock::given(method("GET"))
        .and(path("/readers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "Desk",
                "address": "10.0.0.5",
                "port": 10001,
                "mode": "LRU1002",
                "antennas": [1, 2],
                "antennaMask": "0x03",
                "isConnected": true,
                "connectionStatus": "connected"
            }
        ])))
        .mount(&server)
        .await;

    let status = reader.status().await.unwrap();
    assert!(status.connected);
    assert_eq!(status.mode.as_deref(), Some("LRU1002"));
    assert!(reader.is_connected().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_middleware_is_not_connected() {
    let (server, reader) = setup().await;

    Mock::given(method("GET"))
        .and(path("/readers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!reader.is_connected().await.unwrap());
    assert!(reader.status().await.is_err());
}

// ── Monitoring ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_monitoring_polls_and_diffs() {
    let (server, reader) = setup().await;
    let reader = reader.with_poll_interval(Duration::from_millis(20));
    mount_inventory(&server, json!([{ "id": "A" }, { "id": "B" }])).await;

    let mut events = reader.start_monitoring().await.unwrap();

    for _ in 0..2 {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, ReaderEventKind::Added);
    }

    server.reset().await;
    mount_inventory(&server, json!([{ "id": "A" }])).await;

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.kind, ReaderEventKind::Removed);
    assert_eq!(event.item.id, "B");

    reader.stop_monitoring().await.unwrap();
    let closed = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
}
