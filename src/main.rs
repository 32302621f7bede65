//! Room relay - Entry Point
//!
//! Loads configuration, starts the dispatcher and accepts connections.

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use room_relay::{RelayConfig, RelayServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=room_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("room_relay=info")),
        )
        .init();

    // Bind address from command line takes precedence over RELAY_ADDR
    let mut config = RelayConfig::from_env()?;
    if let Some(addr) = env::args().nth(1) {
        config = config.with_bind_addr(addr);
    }

    let server = RelayServer::bind(&config).await?;
    info!("Room relay listening on {}", server.local_addr()?);
    info!(
        "Broadcast queue capacity {}, outbound buffer {}",
        config.queue_capacity, config.outbound_buffer
    );

    server.run().await;

    Ok(())
}
