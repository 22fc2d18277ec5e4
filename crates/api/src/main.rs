use std::sync::Arc;

use anyhow::Context;

use postgate_api::app::{self, services};
use postgate_infra::config::AppConfig;
use postgate_infra::workers::SessionSweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    postgate_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(
        services::build_services(&config)
            .await
            .context("failed to initialise storage backends")?,
    );

    let sweeper = SessionSweeper::spawn(Arc::clone(&services.sessions), config.sweep_interval);

    let app = app::build_app(services);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    sweeper.shutdown().await;
    Ok(())
}
