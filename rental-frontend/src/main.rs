use dotenvy::dotenv;
use rental_core::observability::logging::init_tracing;
use rental_frontend::config::get_configuration;
use rental_frontend::services::auth_client::{AuthApi, HttpAuthClient};
use rental_frontend::startup::build_router;
use rental_frontend::AppState;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    // Initialize tracing using shared logic
    init_tracing("rental-frontend", "info", "http://tempo:4317");

    rental_frontend::services::metrics::init_metrics();

    let auth_client: Arc<dyn AuthApi> =
        Arc::new(HttpAuthClient::new(configuration.auth_service.clone()));

    // In-flight session hydration selects against this token, so shutdown
    // never lets a torn-down guard apply a stale verdict.
    let shutdown = CancellationToken::new();
    let state = AppState::new(auth_client, configuration.session.clone(), shutdown.clone());

    let app = build_router(state);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting rental-frontend on {}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

    Ok(())
}
