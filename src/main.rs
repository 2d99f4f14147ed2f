use amoeba_backend::{init_tracing, AppState, Settings, WebhookServer};
use anyhow::Context;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env().context("Failed to load configuration")?;

    init_tracing(&settings.log_level);
    tracing::info!(
        "Starting {} v{} ({})",
        amoeba_backend::config::SERVICE_NAME,
        amoeba_backend::config::API_VERSION,
        settings.environment
    );

    let state = Arc::new(AppState::new(settings).context("Failed to initialise state")?);
    let mut server = WebhookServer::new(state);
    server.start().await.context("Failed to start webhook server")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    server.stop();
    server.wait().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
