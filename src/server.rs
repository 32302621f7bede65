//! Relay server
//!
//! Owns the shared room directory and the broadcast queue, keeps the
//! dispatcher running, and spawns one handler task per accepted connection.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::directory::RoomDirectory;
use crate::dispatcher::{BroadcastQueue, Dispatcher};
use crate::error::AppError;
use crate::handler::handle_connection;

/// State shared by every connection handler
#[derive(Debug, Clone)]
pub struct RelayState {
    pub directory: Arc<RoomDirectory>,
    pub queue: BroadcastQueue,
    /// Per-connection outbound buffer size
    pub outbound_buffer: usize,
}

impl RelayState {
    /// Create an empty directory and start its dispatcher
    ///
    /// Must be called within a Tokio runtime.
    pub fn start(config: &RelayConfig) -> Self {
        let directory = Arc::new(RoomDirectory::new());
        let (queue, dispatcher) = Dispatcher::channel(directory.clone(), config);
        tokio::spawn(dispatcher.run());

        Self {
            directory,
            queue,
            outbound_buffer: config.outbound_buffer,
        }
    }
}

/// Listening relay
pub struct RelayServer {
    listener: TcpListener,
    state: RelayState,
}

impl RelayServer {
    /// Bind the configured address and start the dispatcher
    pub async fn bind(config: &RelayConfig) -> Result<Self, AppError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        Ok(Self::with_listener(listener, config))
    }

    /// Use an already bound listener
    pub fn with_listener(listener: TcpListener, config: &RelayConfig) -> Self {
        Self {
            listener,
            state: RelayState::start(config),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Connection accept loop
    ///
    /// Runs until the task is dropped; accept errors are logged and skipped.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let state = self.state.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
