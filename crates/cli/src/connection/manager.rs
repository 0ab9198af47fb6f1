// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel connection lifecycle.
//!
//! A single driver task owns the transport. The [`ConnectionManager`] handle
//! sends it commands and reads its published state, so connect, disconnect,
//! inbound frames and reconnect timers are all handled one at a time.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use fl_core::{
    codes, Backoff, BackoffPolicy, ClientMessage, ErrorInfo, EventKind, InboundEvent, Priority,
    ServerMessage,
};

use super::hub::{EventHub, SubscriptionId};
use super::notify::{Notification, Notifier, Permission, SilentNotifier};
use super::transport::{Endpoint, Transport, TransportError, WebSocketTransport};
use crate::lock;

/// Lifecycle state of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    /// Lost after a successful open; a reconnect is scheduled.
    Reconnecting,
    /// Initial connect failed, or reconnect attempts ran out.
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned to callers of [`ConnectionManager`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("connection manager has stopped")]
    Stopped,
}

/// Configuration for the connection manager.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// When false the manager never opens a connection.
    pub enabled: bool,
    pub endpoint: Endpoint,
    /// Reconnect attempts after an unintended close before giving up.
    pub max_attempts: u32,
    /// Delay before the first reconnect; doubles on each failure.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Pause between the disconnect and connect halves of a manual reconnect.
    pub manual_reconnect_pause: Duration,
    /// Item priorities that raise a user notification.
    pub notification_priorities: HashSet<Priority>,
}

impl ConnectionConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            enabled: true,
            endpoint,
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            manual_reconnect_pause: Duration::from_secs(1),
            notification_priorities: [Priority::Critical, Priority::High].into_iter().collect(),
        }
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(
            BackoffPolicy::new(self.base_delay, self.max_attempts).with_max_delay(self.max_delay),
        )
    }
}

/// State shared between the driver task and every handle.
///
/// The status is published on a watch channel; the attempt counter is an
/// atomic for lock-free reads.
pub struct SharedConnectionState {
    status: watch::Sender<ConnectionStatus>,
    attempt: AtomicU32,
    max_attempts: u32,
}

impl SharedConnectionState {
    fn new(max_attempts: u32) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            status,
            attempt: AtomicU32::new(0),
            max_attempts,
        }
    }

    pub fn get(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    fn set(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::debug!(from = %previous, to = %status, "connection status changed");
        }
    }

    /// Current reconnect attempt, 0 when not reconnecting.
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    fn set_attempt(&self, attempt: u32) {
        self.attempt.store(attempt, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionStatus::Connected
    }

    /// Human-readable status, e.g. `reconnecting (attempt 2/5)`.
    pub fn status_string(&self) -> String {
        match self.get() {
            ConnectionStatus::Reconnecting => {
                format!(
                    "reconnecting (attempt {}/{})",
                    self.attempt(),
                    self.max_attempts
                )
            }
            other => other.as_str().to_string(),
        }
    }

    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }
}

/// The most recent event received over the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    pub event: InboundEvent,
    pub received_at: DateTime<Utc>,
}

enum Command {
    Connect(oneshot::Sender<Result<(), ConnectionError>>),
    Disconnect(oneshot::Sender<()>),
    PermissionResolved(Permission),
}

/// Handle to the push-channel driver.
///
/// Dropping the last handle stops the driver and closes the transport.
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<SharedConnectionState>,
    hub: EventHub,
    last_message: Arc<Mutex<Option<ReceivedEvent>>>,
    manual_reconnect_pause: Duration,
    cancel_token: CancellationToken,
}

impl ConnectionManager {
    /// Creates a manager over a WebSocket transport with notifications off.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_transport(config, WebSocketTransport::new(), Arc::new(SilentNotifier))
    }

    /// Creates a manager over `transport`, spawning its driver task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_transport<T>(
        config: ConnectionConfig,
        transport: T,
        notifier: Arc<dyn Notifier>,
    ) -> Self
    where
        T: Transport + 'static,
    {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SharedConnectionState::new(config.max_attempts));
        let hub = EventHub::new();
        let last_message = Arc::new(Mutex::new(None));
        let cancel_token = CancellationToken::new();
        let manual_reconnect_pause = config.manual_reconnect_pause;

        let driver = Driver {
            backoff: config.backoff(),
            config,
            transport,
            shared: Arc::clone(&shared),
            hub: hub.clone(),
            notifier,
            last_message: Arc::clone(&last_message),
            commands: commands.downgrade(),
            reconnect_at: None,
            deferred: Vec::new(),
            permission_pending: false,
        };
        tokio::spawn(driver.run(command_rx, cancel_token.clone()));

        ConnectionManager {
            commands,
            shared,
            hub,
            last_message,
            manual_reconnect_pause,
            cancel_token,
        }
    }

    /// Opens the channel. No-op if already connected.
    ///
    /// A failure here sets [`ConnectionStatus::Error`] without scheduling
    /// any reconnect.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Connect(tx))
            .map_err(|_| ConnectionError::Stopped)?;
        rx.await.map_err(|_| ConnectionError::Stopped)?
    }

    /// Closes the channel and cancels any scheduled reconnect.
    pub async fn disconnect(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Disconnect(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Disconnects, pauses, then connects again.
    pub async fn reconnect(&self) -> Result<(), ConnectionError> {
        self.disconnect().await;
        tokio::time::sleep(self.manual_reconnect_pause).await;
        self.connect().await
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.get()
    }

    pub fn status_string(&self) -> String {
        self.shared.status_string()
    }

    pub fn attempt(&self) -> u32 {
        self.shared.attempt()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.watch()
    }

    pub fn last_message(&self) -> Option<ReceivedEvent> {
        lock(&self.last_message).clone()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.hub.subscribe(kind, handler)
    }

    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.hub.subscribe_all(handler)
    }

    pub fn on_error<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ErrorInfo) + Send + Sync + 'static,
    {
        self.hub.on_error(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Stops the driver task, closing the transport.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

struct Driver<T> {
    config: ConnectionConfig,
    transport: T,
    shared: Arc<SharedConnectionState>,
    hub: EventHub,
    notifier: Arc<dyn Notifier>,
    last_message: Arc<Mutex<Option<ReceivedEvent>>>,
    commands: mpsc::WeakUnboundedSender<Command>,
    backoff: Backoff,
    /// When the next reconnect attempt fires, if one is scheduled.
    reconnect_at: Option<Instant>,
    /// Notifications held until a permission request resolves.
    deferred: Vec<Notification>,
    permission_pending: bool,
}

impl<T: Transport> Driver<T> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancel_token: CancellationToken,
    ) {
        loop {
            let connected = self.shared.is_connected();
            let reconnect_at = self.reconnect_at;

            tokio::select! {
                _ = cancel_token.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                inbound = self.transport.recv(), if connected => match inbound {
                    Ok(Some(msg)) => self.dispatch(msg),
                    Ok(None) => self.on_lost(None).await,
                    Err(e) if !e.is_fatal() => {
                        tracing::warn!(error = %e, "dropping malformed frame");
                        self.hub.emit_error(&ErrorInfo::malformed(e.to_string()));
                    }
                    Err(e) => self.on_lost(Some(e)).await,
                },
                _ = tokio::time::sleep_until(reconnect_at.unwrap_or_else(Instant::now)),
                    if reconnect_at.is_some() => self.attempt_reconnect().await,
            }
        }

        self.reconnect_at = None;
        let _ = self.transport.disconnect().await;
        self.shared.set(ConnectionStatus::Disconnected);
        tracing::debug!("connection driver stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(reply) => {
                let result = self.connect().await;
                let _ = reply.send(result);
            }
            Command::Disconnect(reply) => {
                self.disconnect().await;
                let _ = reply.send(());
            }
            Command::PermissionResolved(permission) => self.permission_resolved(permission),
        }
    }

    async fn connect(&mut self) -> Result<(), ConnectionError> {
        if !self.config.enabled {
            tracing::debug!("push channel disabled, not connecting");
            return Ok(());
        }
        if self.shared.is_connected() {
            return Ok(());
        }

        // An explicit connect supersedes any scheduled reconnect
        self.reconnect_at = None;
        self.backoff.reset();
        self.shared.set_attempt(0);
        self.shared.set(ConnectionStatus::Connecting);
        let _ = self.transport.disconnect().await;

        match self.transport.connect(&self.config.endpoint).await {
            Ok(()) => {
                self.on_open().await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(url = %self.config.endpoint.url, error = %e, "connect failed");
                self.shared.set(ConnectionStatus::Error);
                self.hub.emit_error(&ErrorInfo::network(e.to_string()));
                Err(ConnectionError::Transport(e))
            }
        }
    }

    async fn disconnect(&mut self) {
        self.reconnect_at = None;
        self.backoff.reset();
        self.shared.set_attempt(0);
        if let Err(e) = self.transport.disconnect().await {
            tracing::debug!(error = %e, "error closing transport");
        }
        self.shared.set(ConnectionStatus::Disconnected);
    }

    async fn on_open(&mut self) {
        self.backoff.reset();
        self.shared.set_attempt(0);
        self.shared.set(ConnectionStatus::Connected);
        tracing::info!(url = %self.config.endpoint.url, "connected");

        if let Some(user_id) = self.config.endpoint.user_id.clone() {
            if let Err(e) = self.transport.send(ClientMessage::subscribe(user_id)).await {
                self.on_lost(Some(e)).await;
            }
        }
    }

    /// Handles a close the caller did not ask for.
    async fn on_lost(&mut self, error: Option<TransportError>) {
        match error {
            Some(e) => tracing::warn!(error = %e, "connection lost"),
            None => tracing::warn!("connection closed by server"),
        }
        let _ = self.transport.disconnect().await;
        self.shared.set(ConnectionStatus::Reconnecting);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        match self.backoff.next_delay() {
            Some(delay) => {
                let attempt = self.backoff.attempt();
                self.shared.set_attempt(attempt);
                self.reconnect_at = Some(Instant::now() + delay);
                tracing::info!(
                    attempt,
                    max_attempts = self.config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "scheduling reconnect"
                );
            }
            None => {
                self.reconnect_at = None;
                self.shared.set(ConnectionStatus::Error);
                let error = ErrorInfo::reconnect_exhausted(self.config.max_attempts);
                tracing::error!(error = %error, "giving up on reconnect");
                self.hub.emit_error(&error);
            }
        }
    }

    async fn attempt_reconnect(&mut self) {
        self.reconnect_at = None;
        match self.transport.connect(&self.config.endpoint).await {
            Ok(()) => self.on_open().await,
            Err(e) => {
                tracing::debug!(attempt = self.backoff.attempt(), error = %e, "reconnect failed");
                self.schedule_reconnect();
            }
        }
    }

    fn dispatch(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Error { message } => {
                tracing::warn!(%message, "server reported an error");
                self.hub
                    .emit_error(&ErrorInfo::new(codes::SERVER_ERROR, message));
            }
            ServerMessage::Pong { id } => {
                tracing::debug!(id, "pong");
            }
            other => {
                let Some(event) = other.into_event() else {
                    return;
                };
                tracing::debug!(kind = %event.kind(), id = %event.item_id(), "event received");
                *lock(&self.last_message) = Some(ReceivedEvent {
                    event: event.clone(),
                    received_at: Utc::now(),
                });
                self.hub.publish(&event);
                self.maybe_notify(&event);
            }
        }
    }

    fn maybe_notify(&mut self, event: &InboundEvent) {
        let Some(priority) = event.priority() else {
            return;
        };
        if !self.config.notification_priorities.contains(&priority) {
            return;
        }
        let Some(notification) = Notification::for_event(event) else {
            return;
        };

        match self.notifier.permission() {
            Permission::Granted => self.notifier.notify(&notification),
            Permission::Denied => {
                tracing::debug!(id = %notification.item_id, "notifications denied, skipping");
            }
            Permission::Default => {
                self.deferred.push(notification);
                self.request_permission();
            }
        }
    }

    fn request_permission(&mut self) {
        if self.permission_pending {
            return;
        }
        self.permission_pending = true;
        let notifier = Arc::clone(&self.notifier);
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let permission = notifier.request_permission().await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::PermissionResolved(permission));
            }
        });
    }

    fn permission_resolved(&mut self, permission: Permission) {
        self.permission_pending = false;
        let deferred = std::mem::take(&mut self.deferred);
        if permission == Permission::Granted {
            for notification in &deferred {
                self.notifier.notify(notification);
            }
        } else {
            tracing::debug!(dropped = deferred.len(), "notification permission not granted");
        }
    }
}
