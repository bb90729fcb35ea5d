use anyhow::Context;

use gatehouse_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gatehouse_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    if config.google_client_id.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set; token audience is not checked");
    }

    let app = gatehouse_api::app::build_app(&config)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
