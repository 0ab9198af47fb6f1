// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Alert items delivered over the push channel.
//!
//! An [`Item`] is one alert on the dashboard feed (a lead that became active,
//! a price change on a watched property, an assignment). [`PartialItem`] is the
//! sparse form carried by `item-updated` events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Identifier of an item, assigned by the backend.
pub type ItemId = String;

/// Urgency of an alert.
///
/// Ordered so that `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "LOW")]
    Low,
    #[serde(alias = "MEDIUM")]
    Medium,
    #[serde(alias = "HIGH")]
    High,
    #[serde(alias = "CRITICAL")]
    Critical,
}

impl Priority {
    /// Returns the string representation used on the wire and in config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(Error::InvalidPriority(s.to_string())),
        }
    }
}

/// A single alert on the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub priority: Priority,
    /// Alert category as labelled by the backend (e.g. "listing", "price-change").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, priority: Priority) -> Self {
        Item {
            id: id.into(),
            title: title.into(),
            message: String::new(),
            priority,
            category: None,
            client_id: None,
            property_id: None,
            assigned_to: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// Merges the fields present in `patch` into this item.
    ///
    /// The id is never changed. Returns false when the patch targets another item.
    pub fn apply(&mut self, patch: &PartialItem) -> bool {
        if patch.id != self.id {
            return false;
        }
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(ref message) = patch.message {
            self.message = message.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(ref category) = patch.category {
            self.category = Some(category.clone());
        }
        if let Some(ref assigned_to) = patch.assigned_to {
            self.assigned_to = Some(assigned_to.clone());
        }
        if let Some(read) = patch.read {
            self.read = read;
        }
        true
    }
}

/// Sparse update to an existing item. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialItem {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

impl PartialItem {
    pub fn new(id: impl Into<ItemId>) -> Self {
        PartialItem {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Payload of an `item-deleted` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedItem {
    pub id: ItemId,
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
