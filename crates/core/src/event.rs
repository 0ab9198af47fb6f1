// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server-originated events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::item::{DeletedItem, Item, ItemId, PartialItem, Priority};

/// Discriminant of an [`InboundEvent`], used to route subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    NewItem,
    ItemUpdated,
    ItemAssigned,
    ItemDeleted,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::NewItem,
        EventKind::ItemUpdated,
        EventKind::ItemAssigned,
        EventKind::ItemDeleted,
    ];

    /// Returns the wire name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NewItem => "new-item",
            EventKind::ItemUpdated => "item-updated",
            EventKind::ItemAssigned => "item-assigned",
            EventKind::ItemDeleted => "item-deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "new-item" => Ok(EventKind::NewItem),
            "item-updated" => Ok(EventKind::ItemUpdated),
            "item-assigned" => Ok(EventKind::ItemAssigned),
            "item-deleted" => Ok(EventKind::ItemDeleted),
            _ => Err(Error::InvalidEventKind(s.to_string())),
        }
    }
}

/// An event pushed by the server. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum InboundEvent {
    NewItem(Item),
    ItemUpdated(PartialItem),
    ItemAssigned(Item),
    ItemDeleted(DeletedItem),
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::NewItem(_) => EventKind::NewItem,
            InboundEvent::ItemUpdated(_) => EventKind::ItemUpdated,
            InboundEvent::ItemAssigned(_) => EventKind::ItemAssigned,
            InboundEvent::ItemDeleted(_) => EventKind::ItemDeleted,
        }
    }

    pub fn item_id(&self) -> &ItemId {
        match self {
            InboundEvent::NewItem(item) | InboundEvent::ItemAssigned(item) => &item.id,
            InboundEvent::ItemUpdated(patch) => &patch.id,
            InboundEvent::ItemDeleted(deleted) => &deleted.id,
        }
    }

    /// Priority of the event, if it carries a full item.
    pub fn priority(&self) -> Option<Priority> {
        match self {
            InboundEvent::NewItem(item) | InboundEvent::ItemAssigned(item) => Some(item.priority),
            InboundEvent::ItemUpdated(_) | InboundEvent::ItemDeleted(_) => None,
        }
    }

    /// The full item, for kinds that carry one.
    pub fn item(&self) -> Option<&Item> {
        match self {
            InboundEvent::NewItem(item) | InboundEvent::ItemAssigned(item) => Some(item),
            InboundEvent::ItemUpdated(_) | InboundEvent::ItemDeleted(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
