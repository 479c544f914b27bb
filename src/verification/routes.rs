use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use serde::Serialize;

use super::types::{CreateSessionRequest, Session, VerificationResult};
use crate::app::AppContext;
use crate::http::{CreatedResponse, JsonResponse, RouteModule};
use crate::webhooks::WebhookAck;

/// `POST /sessions`, `GET /sessions/{id}/result` and `POST /webhook`
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationModule;

impl RouteModule for VerificationModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/sessions", post(create_session))
            .route("/sessions/{id}/result", get(get_result))
            .route("/webhook", post(webhook))
    }
}

#[derive(Debug, Serialize)]
pub struct SessionEnvelope {
    pub session: Session,
}

#[derive(Debug, Serialize)]
pub struct ResultEnvelope {
    pub result: VerificationResult,
}

/// The body is parsed leniently; anything but a JSON object creates a session
/// with the default policy.
async fn create_session(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> CreatedResponse<SessionEnvelope> {
    let request = CreateSessionRequest::from_body(&body);
    let session = ctx.verification.create_session(request).await;
    let location = format!("/sessions/{}/result", session.id);

    CreatedResponse::new(SessionEnvelope { session }, location)
}

async fn get_result(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> JsonResponse<ResultEnvelope> {
    let result = ctx.verification.get_result(&id).await?;
    Ok(Json(ResultEnvelope { result }))
}

/// Always 200, whatever the signature or payload
async fn webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<WebhookAck> {
    let signature = headers
        .get(ctx.signature_header.as_str())
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    Json(ctx.verification.handle_raw_webhook(&body, signature).await)
}
