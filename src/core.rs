use crate::{
    app::AppContext,
    config::Config,
    health::HealthModule,
    http::RouteModule,
    openapi::OpenApiModule,
    verification::VerificationModule,
};
use axum::{Router, extract::DefaultBodyLimit};
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

/// Generates a UUID v4 `x-request-id` for requests that arrive without one
#[derive(Clone, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = uuid::Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

/// The verification HTTP service
///
/// Owns the router and the [`AppContext`] (and through it the stores) for the
/// lifetime of the server; the stores are dropped when `serve` returns.
pub struct App {
    router: Router<AppContext>,
    config: Config,
    context: AppContext,
}

impl App {
    /// App with default configuration and all standard modules
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// App with all standard modules, its context built from `config`
    pub fn with_config(config: Config) -> Self {
        Self::builder()
            .with_context(AppContext::from_config(&config))
            .with_config(config)
            .register_module(VerificationModule)
            .register_module(HealthModule)
            .register_module(OpenApiModule)
            .build()
    }

    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Register a route module with the application
    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        self.router = module.register(self.router);
        self
    }

    /// Router with state and middleware applied, for driving the app in tests
    pub fn into_test_router(self) -> Router {
        let app = self.with_middleware();
        app.router.with_state(app.context)
    }

    fn with_middleware(mut self) -> Self {
        let mut router = self.router;

        // Middleware order (outer to inner): trace, request id, body limit

        router = router.layer(DefaultBodyLimit::max(self.config.server.max_body_size));

        router = router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        router = router.layer(TraceLayer::new_for_http());

        self.router = router;
        self
    }

    /// Start the server and run until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let addr = self
            .config
            .server
            .addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let signed = self.context.verification.signature_checking_enabled();
        let app = self.with_middleware();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Server starting on http://{}", addr);
        if !signed {
            tracing::warn!("No webhook shared secret configured, signatures will not be checked");
        }

        // Router<AppContext> is missing its state; with_state yields a servable Router<()>
        let final_router = app.router.with_state(app.context);

        axum::serve(listener, final_router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for App with fluent API
#[must_use = "builder does nothing until you call build()"]
pub struct AppBuilder {
    config: Config,
    context: AppContext,
    modules: Vec<Router<AppContext>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            context: AppContext::default(),
            modules: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_context(mut self, context: AppContext) -> Self {
        self.context = context;
        self
    }

    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        self.modules.push(module.register(Router::new()));
        self
    }

    pub fn build(self) -> App {
        let mut router = Router::new();
        for module_router in self.modules {
            router = router.merge(module_router);
        }

        App {
            router,
            config: self.config,
            context: self.context,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give in-flight requests a moment to finish
    tokio::time::sleep(Duration::from_millis(500)).await;
    tracing::info!("Shutdown complete");
}
