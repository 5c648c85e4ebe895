//! Integration tests for the HTTP API, driven through the router with `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use flashdeck::FlashdeckConfig;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

fn test_router(config: ServerConfig) -> Router {
    let mut pipeline = FlashdeckConfig::default();
    pipeline.normalize.fetch_images = false;
    build_router(Arc::new(ServerState::with_pipeline(config, pipeline)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, request_id)
}

fn convert_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/plain")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn converts_fenced_payload() {
    let body = "Here are your cards:\n```json\n{\"cards\": [{\"front\": \"Q\", \"back\": \"A\", \"tags\": [\"renal physiology\"]}]}\n```";
    let (status, deck, request_id) =
        send(test_router(ServerConfig::default()), convert_request("/api/v1/convert", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(request_id.is_some_and(|id| !id.is_empty()));
    assert_eq!(deck["cards"].as_array().map(Vec::len), Some(1));
    assert_eq!(deck["cards"][0]["front"], "Q");
    assert_eq!(deck["cards"][0]["back"], "A");
    assert_eq!(deck["cards"][0]["tags"], json!(["renal_physiology"]));
    assert_eq!(deck["warnings"], json!([]));
}

#[tokio::test]
async fn deck_name_query_overrides_payload_name() {
    let body = json!({"deck_name": "From Payload", "cards": [{"front": "Q"}]}).to_string();
    let (status, deck, _) = send(
        test_router(ServerConfig::default()),
        convert_request("/api/v1/convert?deck_name=Renal", body),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(deck["deck_name"], "Renal");
    assert!(deck["file_stem"].as_str().is_some_and(|s| s.starts_with("Renal_")));
}

#[tokio::test]
async fn skipped_cards_are_reported_as_warnings() {
    let body = r#"[{"front": "kept"}, 7, {"type": "cloze", "front": "no markers"}]"#;
    let (status, deck, _) =
        send(test_router(ServerConfig::default()), convert_request("/api/v1/convert", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(deck["cards"].as_array().map(Vec::len), Some(1));
    assert_eq!(deck["warnings"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn malformed_payload_is_bad_request_with_hints() {
    let body = "I'm sorry, but I can't help with that.";
    let (status, err, _) =
        send(test_router(ServerConfig::default()), convert_request("/api/v1/convert", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "MALFORMED_PAYLOAD");
    assert!(err["error"]["details"]["preview"]
        .as_str()
        .is_some_and(|p| p.starts_with("I'm sorry")));
    assert!(err["error"]["details"]["hints"]
        .as_array()
        .is_some_and(|h| !h.is_empty()));
}

#[tokio::test]
async fn payload_without_cards_is_unprocessable() {
    let (status, err, _) =
        send(test_router(ServerConfig::default()), convert_request("/api/v1/convert", "{}")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "NO_VALID_CARDS");
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let (status, err, _) =
        send(test_router(ServerConfig::default()), convert_request("/api/v1/convert", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "EMPTY_PAYLOAD");
}

#[tokio::test]
async fn body_over_limit_is_rejected() {
    let config = ServerConfig {
        max_body_size_mb: 1,
        ..Default::default()
    };
    let body = format!("[{{\"front\": \"{}\"}}]", "x".repeat(2 * 1024 * 1024));
    let (status, err, _) = send(test_router(config), convert_request("/api/v1/convert", body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(err["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/convert")
        .header("x-request-id", "req-123")
        .body(Body::from(r#"[{"front": "Q"}]"#))
        .unwrap();
    let (status, _, request_id) = send(test_router(ServerConfig::default()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(request_id.as_deref(), Some("req-123"));
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let request = Request::builder()
        .uri("/api/v1/nope")
        .body(Body::empty())
        .unwrap();
    let (status, err, _) = send(test_router(ServerConfig::default()), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn info_endpoint_lists_convert() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, info, _) = send(test_router(ServerConfig::default()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["api_version"], "v1");
    assert!(info["endpoints"]
        .as_array()
        .is_some_and(|e| e.iter().any(|v| v == "POST /api/v1/convert")));
}
