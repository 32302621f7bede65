//! Broadcast dispatcher
//!
//! A single consumer drains a bounded FIFO of broadcast jobs and fans each
//! one out to the target room's participants. Having exactly one consumer
//! is what keeps messages to a room in the order they were enqueued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::directory::RoomDirectory;
use crate::error::AppError;
use crate::message::OutboundEvent;
use crate::types::{ClientId, RoomName};

/// A queued fan-out request
#[derive(Debug, Clone)]
pub struct BroadcastJob {
    pub room_name: RoomName,
    pub content: String,
    pub sender: ClientId,
}

/// Producer side of the broadcast queue
///
/// Cloned into every connection's router.
#[derive(Debug, Clone)]
pub struct BroadcastQueue {
    sender: mpsc::Sender<BroadcastJob>,
    enqueue_timeout: Duration,
}

impl BroadcastQueue {
    pub fn new(sender: mpsc::Sender<BroadcastJob>, enqueue_timeout: Duration) -> Self {
        Self {
            sender,
            enqueue_timeout,
        }
    }

    /// Add a job, waiting at most the enqueue timeout for space
    pub async fn enqueue(&self, job: BroadcastJob) -> Result<(), AppError> {
        self.sender
            .send_timeout(job, self.enqueue_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => AppError::QueueOverflow,
                SendTimeoutError::Closed(_) => AppError::DispatcherClosed,
            })
    }
}

/// The broadcast consumer
///
/// Runs for the lifetime of the process; no per-connection or per-room
/// failure stops it.
pub struct Dispatcher {
    directory: Arc<RoomDirectory>,
    receiver: mpsc::Receiver<BroadcastJob>,
    delivery_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher with the given job receiver
    pub fn new(
        directory: Arc<RoomDirectory>,
        receiver: mpsc::Receiver<BroadcastJob>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            receiver,
            delivery_timeout,
        }
    }

    /// Create a bounded queue and the dispatcher draining it
    pub fn channel(directory: Arc<RoomDirectory>, config: &RelayConfig) -> (BroadcastQueue, Self) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let queue = BroadcastQueue::new(tx, config.enqueue_timeout);
        (queue, Self::new(directory, rx, config.delivery_timeout))
    }

    /// Run the dispatch loop
    ///
    /// Continuously receives and delivers jobs until all queue senders are dropped.
    pub async fn run(mut self) {
        info!("Dispatcher started");

        while let Some(job) = self.receiver.recv().await {
            self.handle_job(job).await;
        }

        info!("Dispatcher shutting down");
    }

    /// Deliver one job to every current participant, sender included
    ///
    /// Returns the number of successful deliveries.
    async fn handle_job(&self, job: BroadcastJob) -> usize {
        let room = match self.directory.find_room(&job.room_name).await {
            Ok(room) => room,
            Err(e) => {
                warn!("Dropping message from {}: {}", job.sender, e);
                return 0;
            }
        };

        let participants = room.snapshot().await;
        let event = OutboundEvent::text(job.room_name, job.content);

        let mut delivered = 0;
        let mut failed = Vec::new();
        for participant in participants {
            match participant.deliver(event.clone(), self.delivery_timeout).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        "Delivery to {} in room {} failed: {}",
                        participant.id, event.room_name, e
                    );
                    failed.push(participant);
                }
            }
        }

        // Treat a failed write as an implicit disconnect.
        for participant in failed {
            participant.evict();
            let removed = self.directory.remove_participant(participant.id).await;
            debug!("Client {} dropped from {} room(s)", participant.id, removed);
        }

        debug!("Delivered message in room {} to {} participant(s)", event.room_name, delivered);
        delivered
    }
}
