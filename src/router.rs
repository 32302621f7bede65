//! Per-connection action router
//!
//! Validates each inbound command, applies it to the room directory or the
//! broadcast queue, and answers the originating connection.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn, Level};

use crate::client::Client;
use crate::directory::{CreateOutcome, RoomDirectory};
use crate::dispatcher::{BroadcastJob, BroadcastQueue};
use crate::error::AppError;
use crate::message::{Action, InboundCommand, OutboundEvent};
use crate::types::{ClientId, RoomName};

/// Command loop state for one connection
pub struct ActionRouter {
    client: Client,
    directory: Arc<RoomDirectory>,
    queue: BroadcastQueue,
}

impl ActionRouter {
    pub fn new(client: Client, directory: Arc<RoomDirectory>, queue: BroadcastQueue) -> Self {
        Self {
            client,
            directory,
            queue,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client.id
    }

    /// Drive the router over a stream of decoded commands
    ///
    /// Ends with `Ok` when the stream ends and with the first decode or
    /// transport error otherwise. Does not clean up membership; call
    /// [`ActionRouter::disconnect`] afterwards.
    pub async fn run<S>(&self, commands: S) -> Result<(), AppError>
    where
        S: Stream<Item = Result<InboundCommand, AppError>>,
    {
        tokio::pin!(commands);

        while let Some(next) = commands.next().await {
            let command = next?;
            if let Some(response) = self.handle(command).await? {
                self.client
                    .send(response)
                    .await
                    .map_err(|_| AppError::ChannelSend)?;
            }
        }

        Ok(())
    }

    /// Apply one command
    ///
    /// Returns the Info event for the sender, if any.
    pub async fn handle(&self, command: InboundCommand) -> Result<Option<OutboundEvent>, AppError> {
        let InboundCommand {
            room_name,
            action,
            content,
        } = command;

        let response = match &action {
            Action::CreateRoom => match self.directory.create_room(room_name.clone()).await {
                CreateOutcome::Created => {
                    if tracing::enabled!(Level::DEBUG) {
                        debug!("Existing rooms: {:?}", self.directory.room_names().await);
                    }
                    OutboundEvent::room_created(&room_name)
                }
                CreateOutcome::AlreadyExists => OutboundEvent::room_exists(&room_name),
            },
            Action::JoinRoom => match self.directory.find_room(&room_name).await {
                Ok(room) => {
                    room.join(self.client.clone()).await;
                    info!("Client {} joined room {}", self.client.id, room_name);
                    OutboundEvent::room_joined(&room_name)
                }
                Err(_) => OutboundEvent::room_not_found(&room_name),
            },
            Action::LeaveRoom => match self.directory.find_room(&room_name).await {
                Ok(room) => {
                    room.leave(self.client.id).await;
                    info!("Client {} left room {}", self.client.id, room_name);
                    OutboundEvent::room_left(&room_name)
                }
                Err(_) => OutboundEvent::room_not_found(&room_name),
            },
            Action::SendMessage => {
                return match self.send_message(room_name.clone(), content).await {
                    Ok(()) => Ok(None),
                    Err(e @ (AppError::RoomNotFound(_) | AppError::UnauthorizedSend(_))) => {
                        warn!("Dropping message from {}: {}", self.client.id, e);
                        Ok(None)
                    }
                    Err(AppError::QueueOverflow) => {
                        warn!("Broadcast queue full, dropping message from {}", self.client.id);
                        Ok(Some(OutboundEvent::queue_full(&room_name)))
                    }
                    Err(e) => Err(e),
                };
            }
            Action::Unknown(_) => OutboundEvent::unknown_action(&room_name, &action),
        };

        Ok(Some(response))
    }

    /// Enqueue a message if the sender is a participant of the room
    async fn send_message(&self, room_name: RoomName, content: String) -> Result<(), AppError> {
        let room = self.directory.find_room(&room_name).await?;
        if !room.contains(self.client.id).await {
            return Err(AppError::UnauthorizedSend(room_name));
        }

        self.queue
            .enqueue(BroadcastJob {
                room_name,
                content,
                sender: self.client.id,
            })
            .await
    }

    /// Remove this connection from every room
    pub async fn disconnect(&self) -> usize {
        let removed = self.directory.remove_participant(self.client.id).await;
        debug!("Client {} left {} room(s) on disconnect", self.client.id, removed);
        removed
    }
}
