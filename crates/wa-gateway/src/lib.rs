//! # wa-gateway
//!
//! REST gateway exposing many concurrent WhatsApp Web sessions.
//!
//! ## Architecture
//!
//! This is Layer 3 - the server binary that ties together:
//! - wa-gateway-core: Core types, errors and configuration
//! - wa-gateway-driver: Client handles backed by a driver process
//! - wa-gateway-session: Session registry and lifecycle

#![warn(clippy::all)]

pub mod api;
pub mod cli;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use wa_gateway_core::ServerConfig;
use wa_gateway_driver::DriverFactory;
use wa_gateway_session::{ClientManager, ClientManagerConfig};

pub use cli::Cli;

/// Serve the API until Ctrl-C or SIGTERM, then tear down every session.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    for script in config.driver.missing_scripts() {
        warn!(
            "Driver script {} not found; sessions cannot start until the driver is installed",
            script.display()
        );
    }

    let factory = Arc::new(DriverFactory::new(config.driver.clone()));
    let manager = ClientManager::with_config(factory, ClientManagerConfig::from(&config));
    let app = api::router(manager.clone(), &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutting down gracefully...");
    manager.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
