use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::app::AppContext;
use crate::http::RouteModule;
use crate::verification::VerificationService;

/// Health check status
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: Vec<ComponentHealth>,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status_code, Json(self)).into_response()
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>>;
}

/// Reports the size of the in-memory stores and whether webhook signatures are checked
///
/// Running without a shared secret is reported as `degraded`.
pub struct StoreHealthCheck {
    service: VerificationService,
}

impl StoreHealthCheck {
    pub fn new(service: VerificationService) -> Self {
        Self { service }
    }
}

impl HealthCheck for StoreHealthCheck {
    fn name(&self) -> &str {
        "verification_store"
    }

    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>> {
        Box::pin(async move {
            let (sessions, results) = self.service.store_sizes().await;
            let signed = self.service.signature_checking_enabled();

            let status = if sessions != results {
                HealthStatus::Unhealthy
            } else if !signed {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            };

            ComponentHealth {
                name: self.name().to_string(),
                status,
                message: Some(format!(
                    "{} sessions, {} results, webhook signatures {}",
                    sessions,
                    results,
                    if signed { "checked" } else { "not checked" }
                )),
            }
        })
    }
}

/// Health check manager that runs all registered checks
#[derive(Default)]
pub struct HealthChecker {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub async fn check_health(&self) -> HealthResponse {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        for check in &self.checks {
            let result = check.check().await;

            match result.status {
                HealthStatus::Unhealthy => overall_status = HealthStatus::Unhealthy,
                HealthStatus::Degraded if overall_status == HealthStatus::Healthy => {
                    overall_status = HealthStatus::Degraded
                }
                _ => {}
            }

            checks.push(result);
        }

        HealthResponse {
            status: overall_status,
            checks,
        }
    }
}

/// Liveness probe
pub async fn ping_handler() -> Json<Value> {
    Json(json!({"ok": true, "msg": "pong"}))
}

pub async fn health_handler(State(ctx): State<AppContext>) -> HealthResponse {
    HealthChecker::new()
        .with_check(Arc::new(StoreHealthCheck::new(ctx.verification.clone())))
        .check_health()
        .await
}

/// `GET /ping` and `GET /health`
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthModule;

impl RouteModule for HealthModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/ping", get(ping_handler))
            .route("/health", get(health_handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::CreateSessionRequest;

    #[tokio::test]
    async fn test_ping() {
        let Json(body) = ping_handler().await;
        assert_eq!(body, json!({"ok": true, "msg": "pong"}));
    }

    #[tokio::test]
    async fn test_store_check_degraded_without_secret() {
        let service = VerificationService::default();
        service.create_session(CreateSessionRequest::default()).await;

        let health = StoreHealthCheck::new(service).check().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(health.message.unwrap().starts_with("1 sessions, 1 results"));
    }

    #[tokio::test]
    async fn test_store_check_healthy_with_secret() {
        let service = VerificationService::default().with_shared_secret("s");
        let response = HealthChecker::new()
            .with_check(Arc::new(StoreHealthCheck::new(service)))
            .check_health()
            .await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.checks.len(), 1);
    }

    #[tokio::test]
    async fn test_mismatched_stores_unhealthy() {
        let service = VerificationService::default();
        // a session without its result breaks the pairing invariant
        let session = service.create_session(CreateSessionRequest::default()).await;
        service.sessions().put("orphan", session).await;

        let health = StoreHealthCheck::new(service).check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }
}
