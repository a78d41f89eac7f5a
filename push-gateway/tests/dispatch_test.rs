mod common;

use common::TestApp;
use push_gateway::config::FcmConfig;
use push_gateway::services::{FcmProvider, MockPushProvider, SendError};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn(Arc::new(MockPushProvider::new(true))).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");

    let timestamp = body["timestamp"].as_str().expect("Missing timestamp");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn(Arc::new(MockPushProvider::new(true))).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn readiness_reports_unconfigured_provider() {
    let provider = Arc::new(FcmProvider::new(FcmConfig {
        project_id: String::new(),
        service_account_key: String::new(),
        enabled: true,
    }));
    let app = TestApp::spawn(provider).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 503);
}

// =============================================================================
// Send
// =============================================================================

#[tokio::test]
async fn send_notification_returns_summary() {
    let app = TestApp::spawn(Arc::new(MockPushProvider::new(true))).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/notifications/send", app.address))
        .json(&json!({
            "tokens": ["t0", "t1"],
            "title": "New Message",
            "body": "You have a new message",
            "notificationData": {"action": "open_chat"},
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["successCount"], 2);
    assert_eq!(body["failureCount"], 0);
    assert_eq!(body["failures"], json!([]));
}

#[tokio::test]
async fn send_notification_reports_per_token_failures() {
    let provider = Arc::new(MockPushProvider::with_failures(vec![(
        2,
        SendError {
            message: Some("Requested entity was not found.".to_string()),
            code: Some("NOT_FOUND".to_string()),
        },
    )]));
    let app = TestApp::spawn(provider).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/notifications/send", app.address))
        .json(&json!({"tokens": ["t0", "t1", "t2", "t3"]}))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["successCount"], 3);
    assert_eq!(body["failureCount"], 1);
    assert_eq!(
        body["failures"],
        json!([{"token": "t2", "error": "Requested entity was not found."}])
    );
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn missing_tokens_is_rejected_without_provider_call() {
    let provider = Arc::new(MockPushProvider::new(true));
    let app = TestApp::spawn(provider.clone()).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/notifications/send", app.address))
        .json(&json!({"title": "no recipients"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["kind"], "invalid-argument");
    assert_eq!(
        body["error"]["message"],
        "The 'tokens' array is required and must contain at least one valid device token."
    );
    assert_eq!(provider.send_count(), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = TestApp::spawn(Arc::new(MockPushProvider::new(true))).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/notifications/send", app.address))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["kind"], "invalid-argument");
}

#[tokio::test]
async fn provider_failure_surfaces_internal_error() {
    let app = TestApp::spawn(Arc::new(MockPushProvider::failing_with("connection reset"))).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/notifications/send", app.address))
        .json(&json!({"tokens": ["t0"]}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 500);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["kind"], "internal");
    assert_eq!(
        body["error"]["message"],
        "Unable to send notifications. Please try again later."
    );
    let detail = body["error"]["detail"].as_str().expect("Missing detail");
    assert!(detail.contains("connection reset"));
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let app = TestApp::spawn(Arc::new(MockPushProvider::new(true))).await;
    let client = Client::new();

    client
        .post(format!("{}/notifications/send", app.address))
        .json(&json!({"tokens": ["t0"]}))
        .send()
        .await
        .expect("Failed to execute request");

    let response = client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}
