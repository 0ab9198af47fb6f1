// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod get;
pub mod queue;
pub mod watch;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::offline::JsonlQueue;

/// Opens the persistent queue named by the config.
pub fn open_queue(config: &Config) -> Result<Arc<JsonlQueue>> {
    let path = config.queue_path()?;
    tracing::debug!(path = %path.display(), "opening offline queue");
    Ok(Arc::new(JsonlQueue::open(&path)?))
}

/// Resolves once Ctrl-C is received. Never resolves if the handler cannot be installed.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
