// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local alert feed built from inbound events.
//!
//! The feed is kept newest-first. Applying the same event twice is harmless:
//! inserts replace by id and deletes of missing ids are ignored.

use crate::event::InboundEvent;
use crate::item::{Item, Priority};

/// What applying an event did to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
    Updated,
    Removed,
    /// The event referenced an item the feed does not hold.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct Feed {
    items: Vec<Item>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a feed from an initial page of items, newest first.
    pub fn from_items(items: Vec<Item>) -> Self {
        Feed { items }
    }

    pub fn apply(&mut self, event: &InboundEvent) -> Applied {
        match event {
            InboundEvent::NewItem(item) => {
                let existed = self.remove(&item.id);
                self.items.insert(0, item.clone());
                if existed {
                    Applied::Replaced
                } else {
                    Applied::Inserted
                }
            }
            InboundEvent::ItemUpdated(patch) => match self.position(&patch.id) {
                Some(idx) => {
                    self.items[idx].apply(patch);
                    Applied::Updated
                }
                None => Applied::Ignored,
            },
            InboundEvent::ItemAssigned(item) => match self.position(&item.id) {
                Some(idx) => {
                    self.items[idx] = item.clone();
                    Applied::Replaced
                }
                None => {
                    // Assigned to us without having seen the original alert
                    self.items.insert(0, item.clone());
                    Applied::Inserted
                }
            },
            InboundEvent::ItemDeleted(deleted) => {
                if self.remove(&deleted.id) {
                    Applied::Removed
                } else {
                    Applied::Ignored
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|item| !item.read).count()
    }

    /// Items at or above `min`, preserving feed order.
    pub fn by_priority(&self, min: Priority) -> Vec<&Item> {
        self.items.iter().filter(|item| item.priority >= min).collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn remove(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
