//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol. Inbound records carry an
//! `action`, outbound records carry a `type`; both are keyed by `room_name`.

use serde::{Deserialize, Serialize};

use crate::types::RoomName;

/// Requested action of an inbound command
///
/// Unknown values are kept verbatim so they can be echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    CreateRoom,
    JoinRoom,
    LeaveRoom,
    SendMessage,
    Unknown(String),
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        match value.as_str() {
            "create_room" => Action::CreateRoom,
            "join_room" => Action::JoinRoom,
            "leave_room" => Action::LeaveRoom,
            "send_message" => Action::SendMessage,
            _ => Action::Unknown(value),
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::CreateRoom => "create_room".to_string(),
            Action::JoinRoom => "join_room".to_string(),
            Action::LeaveRoom => "leave_room".to_string(),
            Action::SendMessage => "send_message".to_string(),
            Action::Unknown(value) => value,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Unknown(String::new())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value: String = self.clone().into();
        f.write_str(&value)
    }
}

/// Client → Server command
///
/// Missing fields default to empty, matching lenient JSON clients.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InboundCommand {
    #[serde(default)]
    pub room_name: RoomName,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub content: String,
}

impl InboundCommand {
    pub fn new(room_name: impl Into<String>, action: Action, content: impl Into<String>) -> Self {
        Self {
            room_name: RoomName::new(room_name),
            action,
            content: content.into(),
        }
    }
}

/// Kind of an outbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Relayed chat message
    Text,
    /// Status notification for the originating connection only
    Info,
}

/// Server → Client event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub room_name: RoomName,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub content: String,
}

impl OutboundEvent {
    /// Relayed chat message
    pub fn text(room_name: RoomName, content: impl Into<String>) -> Self {
        Self {
            room_name,
            kind: EventKind::Text,
            content: content.into(),
        }
    }

    /// Status notification
    pub fn info(room_name: RoomName, content: impl Into<String>) -> Self {
        Self {
            room_name,
            kind: EventKind::Info,
            content: content.into(),
        }
    }

    pub fn room_created(room_name: &RoomName) -> Self {
        Self::info(room_name.clone(), format!("created room with name {}", room_name))
    }

    pub fn room_exists(room_name: &RoomName) -> Self {
        Self::info(room_name.clone(), format!("room `{}` already exists", room_name))
    }

    pub fn room_joined(room_name: &RoomName) -> Self {
        Self::info(room_name.clone(), format!("Joined room:{}", room_name))
    }

    pub fn room_left(room_name: &RoomName) -> Self {
        Self::info(room_name.clone(), format!("Left room:{}", room_name))
    }

    pub fn room_not_found(room_name: &RoomName) -> Self {
        Self::info(room_name.clone(), format!("room `{}` not found", room_name))
    }

    pub fn unknown_action(room_name: &RoomName, action: &Action) -> Self {
        Self::info(room_name.clone(), format!("unknown action: {}", action))
    }

    pub fn queue_full(room_name: &RoomName) -> Self {
        Self::info(
            room_name.clone(),
            format!("broadcast queue is full, message to room `{}` was dropped", room_name),
        )
    }
}
