// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for connection tests.

#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use fl_core::{DeletedItem, ErrorInfo, InboundEvent, Item, PartialItem, Priority, ServerMessage};

use super::manager::{ConnectionConfig, ConnectionManager};
use super::notify::{Notification, Notifier, Permission};
use super::transport::Endpoint;
use super::transport_tests::{mock_transport, MockRemote};

/// Notifier that records what it was asked to show.
pub struct RecordingNotifier {
    permission: Mutex<Permission>,
    /// What a permission request resolves to.
    answer: Permission,
    requests: AtomicU32,
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new(permission: Permission) -> Arc<Self> {
        Self::answering(permission, permission)
    }

    /// Starts at `permission` and resolves requests to `answer`.
    pub fn answering(permission: Permission, answer: Permission) -> Arc<Self> {
        Arc::new(RecordingNotifier {
            permission: Mutex::new(permission),
            answer,
            requests: AtomicU32::new(0),
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    fn request_permission(&self) -> Pin<Box<dyn Future<Output = Permission> + Send + '_>> {
        Box::pin(async move {
            self.requests.fetch_add(1, Ordering::SeqCst);
            // The user takes a moment to answer
            tokio::time::sleep(Duration::from_millis(200)).await;
            *self.permission.lock().unwrap() = self.answer;
            self.answer
        })
    }

    fn notify(&self, notification: &Notification) {
        self.shown.lock().unwrap().push(notification.clone());
    }
}

pub fn test_config() -> ConnectionConfig {
    ConnectionConfig::new(
        Endpoint::new("ws://feed.test/ws")
            .with_token("tok-123")
            .with_user("agent-7"),
    )
}

/// Manager over a mock transport with notifications granted.
pub fn start(config: ConnectionConfig) -> (ConnectionManager, MockRemote) {
    let (manager, remote, _) = start_with_notifier(config, RecordingNotifier::new(Permission::Granted));
    (manager, remote)
}

pub fn start_with_notifier(
    config: ConnectionConfig,
    notifier: Arc<RecordingNotifier>,
) -> (ConnectionManager, MockRemote, Arc<RecordingNotifier>) {
    let (transport, remote) = mock_transport();
    let manager = ConnectionManager::with_transport(config, transport, notifier.clone());
    (manager, remote, notifier)
}

/// Forwards every event the manager publishes into a channel.
pub fn collect_events(manager: &ConnectionManager) -> mpsc::UnboundedReceiver<InboundEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    manager.subscribe_all(move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

/// Forwards every surfaced error into a channel.
pub fn collect_errors(manager: &ConnectionManager) -> mpsc::UnboundedReceiver<ErrorInfo> {
    let (tx, rx) = mpsc::unbounded_channel();
    manager.on_error(move |error| {
        let _ = tx.send(error.clone());
    });
    rx
}

pub fn new_item(id: &str, priority: Priority) -> Item {
    let mut item = Item::new(id, format!("Alert {}", id), priority);
    item.message = "Asking price dropped 5%".to_string();
    item
}

pub fn new_item_msg(id: &str, priority: Priority) -> ServerMessage {
    ServerMessage::NewItem(new_item(id, priority))
}

pub fn updated_msg(id: &str) -> ServerMessage {
    let mut patch = PartialItem::new(id);
    patch.read = Some(true);
    ServerMessage::ItemUpdated(patch)
}

pub fn deleted_msg(id: &str) -> ServerMessage {
    ServerMessage::ItemDeleted(DeletedItem { id: id.to_string() })
}
