//! Room directory
//!
//! Registry of all rooms by name. Lookups hand out `Arc<Room>` so every
//! caller sees and mutates the same live participant set.
//!
//! Lock order: directory before room, never the reverse.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::AppError;
use crate::room::Room;
use crate::types::{ClientId, RoomName};

/// Result of a room creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// All rooms known to this process
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: RwLock<HashMap<RoomName, Arc<Room>>>,
}

impl RoomDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new empty room unless one already exists under `name`
    pub async fn create_room(&self, name: RoomName) -> CreateOutcome {
        let mut rooms = self.rooms.write().await;
        match rooms.entry(name) {
            Entry::Occupied(entry) => {
                debug!("Room {} already exists", entry.key());
                CreateOutcome::AlreadyExists
            }
            Entry::Vacant(entry) => {
                info!("Created room {}", entry.key());
                let room = Room::new(entry.key().clone());
                entry.insert(Arc::new(room));
                debug!("Total rooms: {}", rooms.len());
                CreateOutcome::Created
            }
        }
    }

    /// Look up a room by name
    pub async fn find_room(&self, name: &RoomName) -> Result<Arc<Room>, AppError> {
        self.rooms
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::RoomNotFound(name.clone()))
    }

    /// Remove a client from every room it has joined
    ///
    /// Returns the number of rooms the client was removed from.
    pub async fn remove_participant(&self, client_id: ClientId) -> usize {
        // Release the directory lock before touching room locks.
        let rooms: Vec<Arc<Room>> = self.rooms.read().await.values().cloned().collect();

        let mut removed = 0;
        for room in rooms {
            if room.leave(client_id).await {
                debug!("Client {} removed from room {}", client_id, room.name());
                removed += 1;
            }
        }
        removed
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Sorted list of room names
    pub async fn room_names(&self) -> Vec<RoomName> {
        let mut names: Vec<RoomName> = self.rooms.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
