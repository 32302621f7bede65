//! Room struct definition
//!
//! Represents a named chat room with any number of participants.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::client::Client;
use crate::types::{ClientId, RoomName};

/// Named chat room
///
/// The participant map has its own lock, independent of the directory,
/// so membership changes in one room never block another room.
#[derive(Debug)]
pub struct Room {
    /// Room name, fixed at creation
    name: RoomName,
    /// Joined participants
    participants: Mutex<HashMap<ClientId, Client>>,
}

impl Room {
    /// Create a new empty room
    pub fn new(name: RoomName) -> Self {
        Self {
            name,
            participants: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// Add a participant
    ///
    /// Returns false if the client was already a participant.
    pub async fn join(&self, client: Client) -> bool {
        let mut participants = self.participants.lock().await;
        if participants.contains_key(&client.id) {
            return false;
        }
        participants.insert(client.id, client);
        true
    }

    /// Remove a participant
    ///
    /// Returns false if the client was not a participant.
    pub async fn leave(&self, client_id: ClientId) -> bool {
        self.participants.lock().await.remove(&client_id).is_some()
    }

    /// Check if a client is in this room
    pub async fn contains(&self, client_id: ClientId) -> bool {
        self.participants.lock().await.contains_key(&client_id)
    }

    /// Copy the current participants out of the lock
    ///
    /// Callers write to the returned handles after the lock is released.
    pub async fn snapshot(&self) -> Vec<Client> {
        self.participants.lock().await.values().cloned().collect()
    }

    /// Get the number of participants in the room
    pub async fn participant_count(&self) -> usize {
        self.participants.lock().await.len()
    }
}
