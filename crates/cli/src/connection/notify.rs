// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing notifications for high-priority items.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use fl_core::{EventKind, InboundEvent, Item, ItemId, Priority};

/// Whether the user has allowed notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet asked.
    Default,
}

/// A notification derived from an inbound item.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub item_id: ItemId,
    pub priority: Priority,
    pub kind: EventKind,
}

impl Notification {
    pub fn for_item(kind: EventKind, item: &Item) -> Self {
        let title = match kind {
            EventKind::ItemAssigned => format!("Assigned: {}", item.title),
            _ => item.title.clone(),
        };
        Notification {
            title,
            body: item.message.clone(),
            item_id: item.id.clone(),
            priority: item.priority,
            kind,
        }
    }

    /// Builds a notification for events that carry a full item.
    pub fn for_event(event: &InboundEvent) -> Option<Self> {
        event.item().map(|item| Self::for_item(event.kind(), item))
    }
}

/// Sink for platform notifications.
pub trait Notifier: Send + Sync {
    fn permission(&self) -> Permission;

    /// Asks the user for permission. Resolves to the new permission state.
    fn request_permission(&self) -> Pin<Box<dyn Future<Output = Permission> + Send + '_>>;

    fn notify(&self, notification: &Notification);
}

/// Notifier that never shows anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Pin<Box<dyn Future<Output = Permission> + Send + '_>> {
        Box::pin(async { Permission::Denied })
    }

    fn notify(&self, _notification: &Notification) {}
}

/// Notifier that rings the terminal bell and writes a line to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&self) -> Pin<Box<dyn Future<Output = Permission> + Send + '_>> {
        Box::pin(async { Permission::Granted })
    }

    fn notify(&self, notification: &Notification) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "\x07[{}] {}",
            notification.priority.as_str().to_uppercase(),
            notification.title
        );
        if !notification.body.is_empty() {
            let _ = writeln!(stderr, "    {}", notification.body);
        }
    }
}
