//! Taskflow API server entry point.

use std::error::Error;
use std::sync::Arc;

use taskflow_api::config::ApiConfig;
use taskflow_api::state::AppState;
use taskflow_core::clock::SystemClock;
use taskflow_event_bus::InMemoryEventBus;
use taskflow_event_store::InMemoryEventStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Taskflow API server");

    let config = ApiConfig::from_env()?;
    let addr = config.socket_addr()?;

    let app_state = AppState::new(
        Arc::new(InMemoryEventStore::new()),
        Arc::new(InMemoryEventBus::new()),
        Arc::new(SystemClock),
        config.workspace_id.clone(),
    );

    let app = taskflow_api::app(app_state);

    tracing::info!(workspace_id = %config.workspace_id, "Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
