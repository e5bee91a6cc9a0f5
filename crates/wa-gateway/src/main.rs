//! # wa-gateway
//!
//! HTTP server multiplexing WhatsApp Web sessions behind a REST API.
//!
//! ## Overview
//!
//! The server provides endpoints for:
//! - Session management (start, stop, logout, QR code, status)
//! - Messaging, contacts, chats and groups
//! - Status updates and web interface control

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wa_gateway::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        "wa-gateway v{} starting (data path: {})",
        env!("CARGO_PKG_VERSION"),
        config.auth.data_path.display()
    );

    wa_gateway::run(config).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        e
    })?;

    tracing::info!("wa-gateway stopped");
    Ok(())
}
