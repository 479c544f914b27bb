//! Serves the static API description file.

use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::app::AppContext;
use crate::error::{AgeVerifyError, Result};
use crate::http::RouteModule;

/// `GET /openapi.yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiModule;

impl RouteModule for OpenApiModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new().route("/openapi.yaml", get(openapi_handler))
    }
}

async fn openapi_handler(State(ctx): State<AppContext>) -> Result<Response> {
    let contents = tokio::fs::read(&ctx.openapi_path).await.map_err(|e| {
        tracing::warn!(path = %ctx.openapi_path.display(), error = %e, "API description unavailable");
        match e.kind() {
            std::io::ErrorKind::NotFound => AgeVerifyError::not_found("API description not found"),
            _ => AgeVerifyError::from(e),
        }
    })?;

    Ok(([(header::CONTENT_TYPE, "text/yaml")], contents).into_response())
}
