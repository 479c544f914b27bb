//! Webhook signature handling through the HTTP router

use ageverify::testing::{get, post};
use ageverify::webhooks::sign_payload;
use ageverify::{App, ConfigBuilder, UnverifiedPolicy};
use axum::Router;
use serde_json::{Value, json};

const SECRET: &str = "whsec_integration";

fn signed_app(unverified: UnverifiedPolicy) -> Router {
    let config = ConfigBuilder::new()
        .with_shared_secret(SECRET)
        .with_unverified_policy(unverified)
        .build()
        .unwrap();
    App::with_config(config).into_test_router()
}

async fn new_session_id(app: &Router) -> String {
    let body: Value = post(app.clone(), "/sessions")
        .execute()
        .await
        .assert_created()
        .json()
        .await;
    body["session"]["id"].as_str().unwrap().to_string()
}

async fn result_status(app: &Router, id: &str) -> Value {
    let body: Value = get(app.clone(), &format!("/sessions/{}/result", id))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    body["result"]["status"].clone()
}

fn completion_body(id: &str) -> String {
    json!({"event": "verification_complete", "session_id": id, "approved": true}).to_string()
}

#[tokio::test]
async fn test_correct_signature_verifies() {
    let app = signed_app(UnverifiedPolicy::Process);
    let id = new_session_id(&app).await;

    let ack: Value = post(app.clone(), "/webhook")
        .signed_body(SECRET, completion_body(&id))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(ack["received"], true);
    assert_eq!(ack["verified"], true);
    assert_eq!(result_status(&app, &id).await, "complete");
}

#[tokio::test]
async fn test_colon_prefix_and_bare_digest_verify() {
    let app = signed_app(UnverifiedPolicy::Process);
    let body = r#"{"event":"noop"}"#;
    let digest = sign_payload(SECRET, body.as_bytes());

    for header in [format!("sha256:{}", digest), digest.clone()] {
        let ack: Value = post(app.clone(), "/webhook")
            .header("X-Signature", &header)
            .text_body(body)
            .execute()
            .await
            .assert_ok()
            .json()
            .await;
        assert_eq!(ack["verified"], true, "header {}", header);
    }
}

#[tokio::test]
async fn test_tampered_body_is_unverified_but_still_processed() {
    let app = signed_app(UnverifiedPolicy::Process);
    let id = new_session_id(&app).await;

    let signature = sign_payload(SECRET, br#"{"event":"something_else"}"#);
    let ack: Value = post(app.clone(), "/webhook")
        .header("X-Signature", &format!("sha256={}", signature))
        .text_body(completion_body(&id))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(ack["verified"], false);
    assert_eq!(result_status(&app, &id).await, "complete");
}

#[tokio::test]
async fn test_wrong_secret_is_rejected_when_hardened() {
    let app = signed_app(UnverifiedPolicy::Reject);
    let id = new_session_id(&app).await;

    let ack: Value = post(app.clone(), "/webhook")
        .signed_body("not-the-secret", completion_body(&id))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(ack["received"], true);
    assert_eq!(ack["verified"], false);
    assert_eq!(result_status(&app, &id).await, "pending");
}

#[tokio::test]
async fn test_missing_header_with_secret_is_false() {
    let app = signed_app(UnverifiedPolicy::Process);

    let ack: Value = post(app, "/webhook")
        .text_body(r#"{"event":"noop"}"#)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(ack["verified"], false);
}

#[tokio::test]
async fn test_no_secret_reports_null() {
    let app = App::new().into_test_router();
    let body = r#"{"event":"noop"}"#;

    for header in ["", "garbage", "sha256=00"] {
        let mut scenario = post(app.clone(), "/webhook").text_body(body);
        if !header.is_empty() {
            scenario = scenario.header("X-Signature", header);
        }
        let ack: Value = scenario.execute().await.assert_ok().json().await;
        assert_eq!(ack["verified"], Value::Null);
    }

    let ack: Value = post(app, "/webhook")
        .signed_body(SECRET, body)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(ack["verified"], Value::Null);
}
