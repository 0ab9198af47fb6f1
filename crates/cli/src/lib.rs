// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! feedline - a resilient client for a live alert feed.
//!
//! This crate provides the runtime behind the `feedline` CLI: request
//! execution with deduplication and retry, a self-healing push channel,
//! and offline buffering with sync status.
//!
//! # Main Components
//!
//! - [`RequestExecutor`] - retry and dedup around an injected request function
//! - [`ConnectionManager`] - push channel with reconnect and typed subscriptions
//! - [`SyncTracker`] - connectivity, pending counts, and drains of the offline queue
//! - [`Config`] - TOML configuration with defaults for every field
//! - [`Error`] - error types for all operations
//!
//! # Following the feed
//!
//! ```rust,ignore
//! use feedline::{ConnectionConfig, ConnectionManager, Endpoint, EventKind};
//!
//! let endpoint = Endpoint::new("wss://feed.example/ws").with_user("agent-7");
//! let manager = ConnectionManager::new(ConnectionConfig::new(endpoint));
//! manager.subscribe(EventKind::NewItem, |event| println!("{:?}", event));
//! manager.connect().await?;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod connection;
pub mod error;
pub mod http;
pub mod offline;
pub mod request;

pub use cli::{Cli, Command, ConfigCommand, OutputArgs, OutputFormat, QueueCommand, RetryArgs};
pub use config::Config;
pub use connection::{
    ConnectionConfig, ConnectionManager, ConnectionStatus, Endpoint, Notifier, Transport,
};
pub use error::{Error, Result};
pub use fl_core::{ErrorInfo, EventKind, InboundEvent, Item, Priority};
pub use http::ApiClient;
pub use offline::{JsonlQueue, SyncTracker};
pub use request::{DedupCache, ExecutionState, RequestExecutor};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    match cli.command {
        Command::Watch {
            user,
            kinds,
            output,
        } => commands::watch::run(&config, user, kinds, output).await,
        Command::Get { path, retry } => commands::get::run(&config, path, retry).await,
        Command::Queue(cmd) => commands::queue::run(&config, cmd).await,
        Command::Config(cmd) => commands::config::run(&config, cli.config.as_deref(), cmd),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
