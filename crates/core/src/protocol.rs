// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel wire messages.
//!
//! The protocol is small:
//! - Client sends one `subscribe` per successful connect (and optional pings)
//! - Server pushes item events and the occasional error or pong
//!
//! Every frame is a JSON object `{"type": ..., "payload": ...}`.

use serde::{Deserialize, Serialize};

use crate::event::InboundEvent;
use crate::item::{DeletedItem, Item, PartialItem};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Route events for this identity to the connection.
    ///
    /// Re-sent after every successful (re)connect.
    Subscribe {
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Keepalive; the server echoes the id in a pong.
    Ping { id: u64 },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    NewItem(Item),
    ItemUpdated(PartialItem),
    ItemAssigned(Item),
    ItemDeleted(DeletedItem),

    /// Server-side problem report. Does not close the connection.
    Error { message: String },

    Pong { id: u64 },
}

impl ClientMessage {
    /// Creates a Subscribe message.
    pub fn subscribe(user_id: impl Into<String>) -> Self {
        ClientMessage::Subscribe {
            user_id: user_id.into(),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Converts an item frame into an [`InboundEvent`].
    ///
    /// Returns `None` for control frames (error, pong).
    pub fn into_event(self) -> Option<InboundEvent> {
        match self {
            ServerMessage::NewItem(item) => Some(InboundEvent::NewItem(item)),
            ServerMessage::ItemUpdated(patch) => Some(InboundEvent::ItemUpdated(patch)),
            ServerMessage::ItemAssigned(item) => Some(InboundEvent::ItemAssigned(item)),
            ServerMessage::ItemDeleted(deleted) => Some(InboundEvent::ItemDeleted(deleted)),
            ServerMessage::Error { .. } | ServerMessage::Pong { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl From<InboundEvent> for ServerMessage {
    fn from(event: InboundEvent) -> Self {
        match event {
            InboundEvent::NewItem(item) => ServerMessage::NewItem(item),
            InboundEvent::ItemUpdated(patch) => ServerMessage::ItemUpdated(patch),
            InboundEvent::ItemAssigned(item) => ServerMessage::ItemAssigned(item),
            InboundEvent::ItemDeleted(deleted) => ServerMessage::ItemDeleted(deleted),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
