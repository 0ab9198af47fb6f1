// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push channel for live feed events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐ commands ┌──────────┐     ┌─────────────┐     ┌────────┐
//! │ConnectionManager │─────────►│  Driver  │────►│  Transport  │────►│ Server │
//! │     (handle)     │◄─────────│  (task)  │◄────│   (trait)   │◄────│        │
//! └──────────────────┘  status  └──────────┘     └─────────────┘     └────────┘
//!                                    │
//!                          ┌─────────┴─────────┐
//!                          ▼                   ▼
//!                    ┌──────────┐        ┌──────────┐
//!                    │ EventHub │        │ Notifier │
//!                    └──────────┘        └──────────┘
//! ```
//!
//! # Features
//!
//! - Bearer token and user id attached when the socket opens
//! - `subscribe` re-sent after every successful open
//! - Automatic reconnect with exponential backoff after unintended closes
//! - Typed per-kind event subscriptions plus error observers
//! - Platform notifications for configured priorities
//! - Injectable transport and notifier traits for testing

mod hub;
mod manager;
mod notify;
mod transport;

pub use hub::{ErrorHandler, EventHandler, EventHub, SubscriptionId};
pub use manager::{
    ConnectionConfig, ConnectionError, ConnectionManager, ConnectionStatus, ReceivedEvent,
    SharedConnectionState,
};
pub use notify::{Notification, Notifier, Permission, SilentNotifier, TerminalNotifier};
pub use transport::{
    Endpoint, Transport, TransportError, TransportResult, WebSocketTransport, USER_ID_HEADER,
};

#[cfg(test)]
pub(crate) mod test_helpers;
