//! Client handle definition
//!
//! Represents one attached connection: its identity plus the channel that
//! feeds the connection's write task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::error::DeliveryError;
use crate::message::OutboundEvent;
use crate::types::ClientId;

/// Handle to a connected client
///
/// Cheap to clone. Rooms hold clones of this handle; the connection itself
/// (socket, write task) stays owned by the transport.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Server → Client event channel
    sender: mpsc::Sender<OutboundEvent>,
    /// Fired when the relay gives up on this connection
    eviction: Arc<Notify>,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: ClientId, sender: mpsc::Sender<OutboundEvent>) -> Self {
        Self {
            id,
            sender,
            eviction: Arc::new(Notify::new()),
        }
    }

    /// Send an event to this client, waiting for buffer space
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, event: OutboundEvent) -> Result<(), DeliveryError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| DeliveryError::ChannelClosed)
    }

    /// Send an event, giving up after `timeout` if the buffer stays full
    pub async fn deliver(
        &self,
        event: OutboundEvent,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        self.sender
            .send_timeout(event, timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DeliveryError::TimedOut,
                SendTimeoutError::Closed(_) => DeliveryError::ChannelClosed,
            })
    }

    /// Tell the owning connection to shut down
    ///
    /// The signal is kept until the connection waits for it.
    pub fn evict(&self) {
        self.eviction.notify_one();
    }

    /// Signal shared by every clone of this handle
    ///
    /// Holding it does not keep the event channel open.
    pub fn eviction(&self) -> Arc<Notify> {
        self.eviction.clone()
    }
}
