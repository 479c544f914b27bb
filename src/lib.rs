//! ageverify - a mock third-party age-verification service
//!
//! A client creates a verification session, the provider later reports the
//! outcome through a signed webhook, and the client polls for the result.
//!
//! # Features
//!
//! - **Sessions**: `POST /sessions` creates a session and its pending result
//! - **Webhooks**: `POST /webhook` checks an HMAC-SHA256 signature and
//!   completes the result on `verification_complete`
//! - **Results**: `GET /sessions/{id}/result` polls the outcome
//! - **Ops**: `GET /ping`, `GET /health` and a static `GET /openapi.yaml`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ageverify::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     ageverify::init_tracing();
//!
//!     let config = ConfigBuilder::new()
//!         .from_env()
//!         .build()
//!         .expect("invalid configuration");
//!
//!     App::with_config(config).serve().await.unwrap();
//! }
//! ```

mod app;
mod config;
mod core;
mod error;
pub mod health;
mod http;
pub mod openapi;
pub mod testing;
pub mod utils;
pub mod verification;
pub mod webhooks;

pub use crate::app::{AppContext, AppContextBuilder};
pub use crate::config::{
    Config, ConfigBuilder, LoggingConfig, OpenApiConfig, ServerConfig, SessionConfig,
    WebhookConfig,
};
pub use crate::core::{App, AppBuilder, MakeRequestUuid};
pub use crate::error::{AgeVerifyError, ErrorResponse, Result};
pub use crate::health::{ComponentHealth, HealthCheck, HealthChecker, HealthStatus};
pub use crate::http::{CreatedResponse, JsonResponse, RouteModule};
pub use crate::verification::{
    CompletionPolicy, CreateSessionRequest, Outcome, ResultStatus, Session, SessionStatus,
    UnverifiedPolicy, VerificationResult, VerificationService,
};
pub use crate::webhooks::{WebhookAck, WebhookVerifier};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: log filter (e.g. "info", "ageverify=debug")
/// - `AGEVERIFY_LOG_JSON`: "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from a [`Config`]; `RUST_LOG` still takes precedence
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    install_subscriber(env_filter, config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
