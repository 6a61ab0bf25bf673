//! Cantoria administrative console composition root.

#![forbid(unsafe_code)]

mod console_config;
mod console_router;
mod console_services;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod state;

use cantoria_core::AppError;
use tracing::info;

use crate::console_config::{BackendConfig, ConsoleConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;
    if config.backend == BackendConfig::Memory {
        info!(
            password = dev_seed::DEV_SEED_PASSWORD,
            "memory backend: demo members are <role>@cantoria.local"
        );
    }

    let app_state = console_services::build_app_state(&config).await?;
    let app = console_router::build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "cantoria-console listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("console server error: {error}")))
}
