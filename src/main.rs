use ageverify::{App, ConfigBuilder};
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()
        .from_env()
        .build()
        .context("invalid configuration")?;

    ageverify::init_tracing_with_config(&config);

    tracing::info!(
        port = config.server.port,
        completion_policy = ?config.webhook.completion_policy,
        unverified_policy = ?config.webhook.unverified_policy,
        "Starting age verification service"
    );

    App::with_config(config)
        .serve()
        .await
        .context("server error")
}
