//! Error types for the relay
//!
//! Defines application-level errors and per-connection delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::RoomName;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// recoverable errors (reported to the client or logged).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed inbound payload (fatal to the connection)
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection's own outbound channel is closed (fatal)
    #[error("Channel send error")]
    ChannelSend,

    /// No room with the given name
    #[error("Room not found: {0}")]
    RoomNotFound(RoomName),

    /// Sender is not a participant of the target room
    #[error("Not a participant of room: {0}")]
    UnauthorizedSend(RoomName),

    /// Broadcast queue stayed full for the whole enqueue timeout
    #[error("Broadcast queue is full")]
    QueueOverflow,

    /// The dispatcher has stopped consuming jobs (fatal)
    #[error("Dispatcher closed")]
    DispatcherClosed,
}

/// Delivery errors
///
/// Occurs when a write to one connection's outbound channel fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The channel stayed full for the whole delivery timeout
    #[error("Delivery timed out")]
    TimedOut,
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Value could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    /// Value must be greater than zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
