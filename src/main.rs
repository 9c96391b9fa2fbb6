mod domain;
mod clients;

mod api;
mod app_system;
mod config;
mod store;

#[cfg(test)]
mod mock_framework;
#[cfg(test)]
mod integration_tests;

mod actor_framework;
mod audit_actor;
mod error;
mod order_actor;
mod product_actor;
mod user_actor;
mod voucher_actor;

use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{error, info};

use crate::api::{router, AppState};
use crate::app_system::{setup_tracing, StorefrontSystem};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = Config::load().map_err(|e| e.to_string())?;
    info!(
        bind_addr = %config.bind_addr,
        missing_product_policy = %config.rollback.missing_product_policy,
        "Starting storefront order service"
    );

    let system = StorefrontSystem::new(&config);
    if config.seed_demo {
        system.seed_demo().await.map_err(|e| e.to_string())?;
    }

    let app = router(AppState::new(&system));

    let listener = TcpListener::bind(config.bind_addr).await.map_err(|e| e.to_string())?;
    info!("Server running on {}", config.bind_addr);

    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    if let Err(e) = &served {
        error!(error = %e, "Server stopped with an error");
    }

    // Shutdown system gracefully
    system.shutdown().await?;
    served.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}

async fn shutdown_signal() {
    match ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
