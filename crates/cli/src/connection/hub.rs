// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed fan-out of inbound events to registered handlers.

use std::sync::{Arc, Mutex};

use fl_core::{ErrorInfo, EventKind, InboundEvent};

use crate::lock;

/// Callback invoked for each matching inbound event.
pub type EventHandler = Arc<dyn Fn(&InboundEvent) + Send + Sync>;

/// Callback invoked for each surfaced connection error.
pub type ErrorHandler = Arc<dyn Fn(&ErrorInfo) + Send + Sync>;

/// Handle returned by registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone, Copy)]
enum Filter {
    Kind(EventKind),
    All,
}

impl Filter {
    fn matches(self, kind: EventKind) -> bool {
        match self {
            Filter::Kind(k) => k == kind,
            Filter::All => true,
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    events: Vec<(SubscriptionId, Filter, EventHandler)>,
    errors: Vec<(SubscriptionId, ErrorHandler)>,
}

impl Registry {
    fn allocate(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }
}

/// Registry of event and error observers.
///
/// Handlers run in registration order, outside the registry lock, so a
/// handler may itself subscribe or unsubscribe.
#[derive(Clone, Default)]
pub struct EventHub {
    registry: Arc<Mutex<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of one kind.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.add_event(Filter::Kind(kind), Arc::new(handler))
    }

    /// Registers `handler` for every event kind.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.add_event(Filter::All, Arc::new(handler))
    }

    /// Registers an observer for connection errors.
    pub fn on_error<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ErrorInfo) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.allocate();
        registry.errors.push((id, Arc::new(handler)));
        id
    }

    /// Removes a registration. Returns false if the id was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = lock(&self.registry);
        let before = registry.events.len() + registry.errors.len();
        registry.events.retain(|(sid, _, _)| *sid != id);
        registry.errors.retain(|(sid, _)| *sid != id);
        registry.events.len() + registry.errors.len() != before
    }

    /// Delivers `event` to every matching handler. Returns how many ran.
    pub fn publish(&self, event: &InboundEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = lock(&self.registry)
            .events
            .iter()
            .filter(|(_, filter, _)| filter.matches(kind))
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Delivers `error` to every error observer. Returns how many ran.
    pub fn emit_error(&self, error: &ErrorInfo) -> usize {
        let handlers: Vec<ErrorHandler> = lock(&self.registry)
            .errors
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in &handlers {
            handler(error);
        }
        handlers.len()
    }

    /// Number of live registrations of either kind.
    pub fn len(&self) -> usize {
        let registry = lock(&self.registry);
        registry.events.len() + registry.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_event(&self, filter: Filter, handler: EventHandler) -> SubscriptionId {
        let mut registry = lock(&self.registry);
        let id = registry.allocate();
        registry.events.push((id, filter, handler));
        id
    }
}
