//! End-to-end session lifecycle through the HTTP router

use ageverify::testing::{get, post};
use ageverify::{App, CompletionPolicy, ConfigBuilder};
use axum::Router;
use serde_json::{Value, json};

fn app() -> Router {
    App::new().into_test_router()
}

async fn create_session(app: &Router, body: Value) -> Value {
    let response = post(app.clone(), "/sessions")
        .json_body(&body)
        .execute()
        .await
        .assert_created()
        .assert_json();

    let body: Value = response.json().await;
    body["session"].clone()
}

async fn fetch_result(app: &Router, id: &str) -> Value {
    let body: Value = get(app.clone(), &format!("/sessions/{}/result", id))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    body["result"].clone()
}

async fn send_webhook(app: &Router, payload: Value) -> Value {
    post(app.clone(), "/webhook")
        .json_body(&payload)
        .execute()
        .await
        .assert_ok()
        .json()
        .await
}

#[tokio::test]
async fn test_ping() {
    let body: Value = get(app(), "/ping").execute().await.assert_ok().json().await;
    assert_eq!(body, json!({"ok": true, "msg": "pong"}));
}

#[tokio::test]
async fn test_created_session_is_immediately_resolvable() {
    let app = app();
    let session = create_session(&app, json!({})).await;
    let id = session["id"].as_str().unwrap();

    assert_eq!(session["status"], "created");
    assert_eq!(session["ttl_seconds"], 900);
    assert_eq!(session["policy"], json!({"type": "age_over", "age_threshold": 18}));
    assert!(session["created_at"].as_str().unwrap().ends_with("+00:00"));
    assert!(session["expires_at"].as_str().unwrap().ends_with("+00:00"));

    let result = fetch_result(&app, id).await;
    assert_eq!(
        result,
        json!({
            "session_id": id,
            "status": "pending",
            "outcome": null,
            "reason": null,
            "attributes": {"age_over": true, "age_threshold": 18}
        })
    );
}

#[tokio::test]
async fn test_create_session_location_header() {
    let response = post(app(), "/sessions").execute().await.assert_created().response();
    let location = response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/sessions/") && location.ends_with("/result"));
}

#[tokio::test]
async fn test_caller_policy_drives_attributes() {
    let app = app();
    let session = create_session(
        &app,
        json!({
            "policy": {"type": "age_over", "age_threshold": 21},
            "reference": "order-42",
            "callback_url": "https://merchant.test/hook"
        }),
    )
    .await;

    assert_eq!(session["reference"], "order-42");
    assert_eq!(session["callback_url"], "https://merchant.test/hook");

    let result = fetch_result(&app, session["id"].as_str().unwrap()).await;
    assert_eq!(result["attributes"]["age_threshold"], 21);
}

#[tokio::test]
async fn test_unknown_session_result_is_404() {
    let body: Value = get(app(), "/sessions/never-created/result")
        .execute()
        .await
        .assert_not_found()
        .json()
        .await;

    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Unknown session id");
}

#[tokio::test]
async fn test_rejection_scenario() {
    let app = app();
    let session = create_session(&app, json!({})).await;
    let id = session["id"].as_str().unwrap();

    let payload = json!({
        "event": "verification_complete",
        "session_id": id,
        "approved": false,
        "reason": "age_below_threshold"
    });
    let ack = send_webhook(&app, payload.clone()).await;
    assert_eq!(ack, json!({"received": true, "verified": null, "json": payload}));

    let result = fetch_result(&app, id).await;
    assert_eq!(result["status"], "complete");
    assert_eq!(result["outcome"], "rejected");
    assert_eq!(result["reason"], "age_below_threshold");
}

#[tokio::test]
async fn test_approval_without_approved_field() {
    let app = app();
    let session = create_session(&app, json!({})).await;
    let id = session["id"].as_str().unwrap();

    send_webhook(&app, json!({"event": "verification_complete", "session_id": id})).await;

    let result = fetch_result(&app, id).await;
    assert_eq!(result["status"], "complete");
    assert_eq!(result["outcome"], "approved");
    assert_eq!(result["reason"], Value::Null);
}

#[tokio::test]
async fn test_unmatched_webhooks_change_nothing() {
    let app = app();
    let session = create_session(&app, json!({})).await;
    let id = session["id"].as_str().unwrap();

    let ack = send_webhook(&app, json!({"event": "verification_started", "session_id": id})).await;
    assert_eq!(ack["received"], true);

    let ack = send_webhook(
        &app,
        json!({"event": "verification_complete", "session_id": "someone-else"}),
    )
    .await;
    assert_eq!(ack["received"], true);

    let ack: Value = post(app.clone(), "/webhook")
        .text_body("this is not json")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(ack["json"], json!({}));

    let result = fetch_result(&app, id).await;
    assert_eq!(result["status"], "pending");
    assert_eq!(result["outcome"], Value::Null);
}

#[tokio::test]
async fn test_redelivery_first_wins_by_default() {
    let app = app();
    let session = create_session(&app, json!({})).await;
    let id = session["id"].as_str().unwrap();

    send_webhook(
        &app,
        json!({"event": "verification_complete", "session_id": id, "approved": false, "reason": "age_below_threshold"}),
    )
    .await;
    let ack = send_webhook(
        &app,
        json!({"event": "verification_complete", "session_id": id, "approved": true, "reason": "retry"}),
    )
    .await;
    assert_eq!(ack["received"], true);

    let result = fetch_result(&app, id).await;
    assert_eq!(result["outcome"], "rejected");
    assert_eq!(result["reason"], "age_below_threshold");
}

#[tokio::test]
async fn test_redelivery_last_wins_when_configured() {
    let config = ConfigBuilder::new()
        .with_completion_policy(CompletionPolicy::LastWins)
        .build()
        .unwrap();
    let app = App::with_config(config).into_test_router();
    let session = create_session(&app, json!({})).await;
    let id = session["id"].as_str().unwrap();

    send_webhook(
        &app,
        json!({"event": "verification_complete", "session_id": id, "approved": false, "reason": "age_below_threshold"}),
    )
    .await;
    send_webhook(
        &app,
        json!({"event": "verification_complete", "session_id": id, "approved": true, "reason": "manual_review"}),
    )
    .await;

    let result = fetch_result(&app, id).await;
    assert_eq!(result["outcome"], "approved");
    assert_eq!(result["reason"], "manual_review");
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = app();
    create_session(&app, json!({})).await;

    let body: Value = get(app, "/health").execute().await.assert_ok().json().await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"][0]["name"], "verification_store");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let body = get(app(), "/openapi.yaml")
        .execute()
        .await
        .assert_ok()
        .assert_header("content-type", "text/yaml")
        .body_string()
        .await;

    assert!(body.contains("/sessions/{id}/result"));
    assert!(body.contains("/webhook"));
}

#[tokio::test]
async fn test_structured_reason_keeps_its_type() {
    let app = app();
    let session = create_session(&app, json!({})).await;
    let id = session["id"].as_str().unwrap();

    send_webhook(
        &app,
        json!({"event": "verification_complete", "session_id": id, "approved": false, "reason": {"code": 7}}),
    )
    .await;

    let result = fetch_result(&app, id).await;
    assert_eq!(result["outcome"], "rejected");
    assert_eq!(result["reason"], json!({"code": 7}));
}
