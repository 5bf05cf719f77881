//! HTTP API tests driven through the router with `oneshot`
mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use buddi::api::{self, HealthResponse, HistoryResponse, RootResponse};
use buddi::bot::Bot;
use buddi::store::SweepReport;
use common::{store_at, RecordingTransport};

fn router_with(test_endpoint: bool) -> (Router, Bot, Arc<RecordingTransport>) {
    let (store, _clock) = store_at(0);
    let transport = Arc::new(RecordingTransport::default());
    let bot = Bot::new(store, transport.clone(), Duration::from_secs(1));
    (api::api(bot.clone(), test_endpoint).unwrap(), bot, transport)
}

fn router() -> (Router, Bot) {
    let (app, bot, _transport) = router_with(false);
    (app, bot)
}

fn webhook(form: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(api::paths::messages::WEBHOOK)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (app, _bot) = router();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let root: RootResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(root.endpoints.iter().any(|p| p == "/webhook/message"));
}

#[tokio::test]
async fn test_webhook_delivers_and_health_reports_it() {
    let (app, _bot) = router();
    let response = app
        .clone()
        .oneshot(webhook("From=%2B15551234567&Body=buddi+roast+bob"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Message sent to group");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.status, "OK");
    assert_eq!(health.stats.active_users, 1);
    assert_eq!(health.group.recent_activity[0].last_command, "roast");
    assert_eq!(health.broadcasts.deliveries_succeeded, 1);
}

#[tokio::test]
async fn test_webhook_rejects_bad_senders() {
    let (app, bot, transport) = router_with(false);
    let missing = app.clone().oneshot(webhook("Body=buddi+roast")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let no_body = app.clone().oneshot(webhook("From=%2B15551234567")).await.unwrap();
    assert_eq!(no_body.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_slice(&body_bytes(no_body).await).unwrap();
    assert_eq!(error["error"]["type"], "api_error");
    // rejected before the sender's window is opened or anything is sent
    assert!(bot.limiter().is_empty());
    assert!(transport.sent().is_empty());

    let invalid = app
        .oneshot(webhook("From=12345&Body=buddi+roast"))
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_lookup_normalizes_sender() {
    let (app, bot) = router();
    bot.handle_message("5551234567", "buddi advice about cooking").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(api::paths::history_path("5551234567"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(history.sender, "+15551234567");
    assert_eq!(history.entries.len(), 1);
    assert_eq!(history.entries[0].target.as_deref(), Some("cooking"));
}

#[tokio::test]
async fn test_admin_sweep_returns_report() {
    let (app, _bot) = router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(api::paths::admin::SWEEP)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: SweepReport = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let (app, _bot) = router();
    let response = app
        .oneshot(Request::builder().uri("/webhook/sms").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error["error"]["code"], 404);
    assert_eq!(error["error"]["type"], "not_found");
}

fn test_request(json: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(api::paths::dev::TEST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json))
        .unwrap()
}

#[tokio::test]
async fn test_dev_endpoint_is_opt_in() {
    let (app, _bot) = router();
    let response = app
        .oneshot(test_request(r#"{"message":"buddi roast bob","phoneNumber":"5551234567"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (app, bot, transport) = router_with(true);
    let response = app
        .clone()
        .oneshot(test_request(r#"{"message":"buddi roast bob","phoneNumber":"5551234567"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Message sent to group");
    assert_eq!(transport.sent_to("+15551234567").len(), 1);
    assert_eq!(bot.history("+15551234567").len(), 1);

    let response = app
        .oneshot(test_request(r#"{"phoneNumber":"5551234567"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
