//! Room-based WebSocket Message Relay Library
//!
//! Clients attach over WebSocket, create or join named rooms, and exchange
//! text messages that are relayed to every occupant of the same room.
//!
//! # Features
//! - Room creation (idempotent) and joining/leaving by name
//! - Fan-out of messages to all room participants, sender included
//! - Bounded broadcast queue with a reported overflow
//! - Isolation of broken connections during fan-out
//! - Membership cleanup on disconnect
//!
//! # Architecture
//! - `RoomDirectory` maps names to shared `Arc<Room>` values; each room
//!   guards its participants with its own lock
//! - One `ActionRouter` per connection validates commands and answers them
//! - A single `Dispatcher` task drains the broadcast queue, which keeps
//!   messages in enqueue order
//!
//! # Example
//! ```ignore
//! use room_relay::{RelayConfig, RelayServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RelayConfig::default();
//!     let server = RelayServer::bind(&config).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod room;
pub mod router;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use config::RelayConfig;
pub use directory::{CreateOutcome, RoomDirectory};
pub use dispatcher::{BroadcastJob, BroadcastQueue, Dispatcher};
pub use error::{AppError, ConfigError, DeliveryError};
pub use handler::handle_connection;
pub use message::{Action, EventKind, InboundCommand, OutboundEvent};
pub use room::Room;
pub use router::ActionRouter;
pub use server::{RelayServer, RelayState};
pub use types::{ClientId, RoomName};
