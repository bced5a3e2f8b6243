use std::sync::Arc;

use anyhow::Context;

use printworks_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    printworks_observability::init();

    let config = AppConfig::from_env();
    let services = printworks_api::app::build_services(&config).context("failed to open stores")?;
    let app = printworks_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
