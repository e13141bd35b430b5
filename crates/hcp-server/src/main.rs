//! # hcp-server
//!
//! Entry point of the hosting control panel login gate.

#![forbid(unsafe_code)]

use hcp_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        maintenance = config.panel.maintenance.enabled,
        ssl = config.panel.ssl_enabled,
        "hcp-server starting..."
    );

    Server::new(config)?.run().await
}
