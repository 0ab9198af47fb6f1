// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashSet;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use fl_core::{codes, ErrorInfo, EventKind, Feed, InboundEvent};
use tokio::sync::{mpsc, watch};

use crate::cli::OutputArgs;
use crate::config::Config;
use crate::connection::{
    ConnectionError, ConnectionManager, ConnectionStatus, TerminalNotifier, WebSocketTransport,
};
use crate::error::{Error, Result};
use crate::offline::{HttpDrain, Indicator, SyncTracker, TrackerState};

use super::{open_queue, shutdown_signal};

/// Something the watch loop has to print.
#[derive(Debug)]
enum Line {
    Event(InboundEvent),
    Error(ErrorInfo),
}

/// Follow the live feed until Ctrl-C or until reconnects run out.
pub async fn run(
    config: &Config,
    user: Option<String>,
    kinds: Vec<EventKind>,
    output: OutputArgs,
) -> Result<()> {
    let conn_config = config.connection_config(user.as_deref())?;
    if !conn_config.enabled {
        println!("push channel disabled (connection.enabled = false)");
        return Ok(());
    }
    tracing::info!(url = %conn_config.endpoint.url, "watching feed");

    let manager = ConnectionManager::with_transport(
        conn_config,
        WebSocketTransport::new(),
        Arc::new(TerminalNotifier),
    );
    let tracker = offline_tracker(config);
    let poller = tracker.as_ref().map(SyncTracker::start);

    let mut stdout = std::io::stdout();
    let result = follow(
        &manager,
        &kinds,
        output,
        tracker.as_ref(),
        shutdown_signal(),
        &mut stdout,
    )
    .await;

    manager.shutdown();
    if let Some(tracker) = &tracker {
        tracker.stop();
    }
    if let Some(poller) = poller {
        let _ = poller.await;
    }
    result
}

/// Tracker over the local queue, so the watch shows the offline banners.
///
/// Needs both the queue and `server.api_url`; without either the watch
/// runs without banners.
fn offline_tracker(config: &Config) -> Option<SyncTracker> {
    let client = match config.api_client() {
        Ok(client) => client,
        Err(e) => {
            tracing::debug!(error = %e, "no api client, no sync banners");
            return None;
        }
    };
    let queue = match open_queue(config) {
        Ok(queue) => queue,
        Err(e) => {
            tracing::warn!(error = %e, "offline queue unavailable, no sync banners");
            return None;
        }
    };
    let drain = Arc::new(HttpDrain::new(Arc::clone(&queue), client));
    Some(SyncTracker::new(queue, drain, config.tracker_config(), true))
}

/// Prints events and status changes from `manager` until `shutdown` resolves
/// or the manager gives up reconnecting.
///
/// With a `tracker`, connection status drives its online flag and its
/// banner changes are printed alongside the status lines.
pub(crate) async fn follow<W, S>(
    manager: &ConnectionManager,
    kinds: &[EventKind],
    output: OutputArgs,
    tracker: Option<&SyncTracker>,
    shutdown: S,
    out: &mut W,
) -> Result<()>
where
    W: Write,
    S: Future<Output = ()>,
{
    let filter: HashSet<EventKind> = kinds.iter().copied().collect();
    let (tx, mut lines) = mpsc::unbounded_channel();

    let event_tx = tx.clone();
    manager.subscribe_all(move |event| {
        if filter.is_empty() || filter.contains(&event.kind()) {
            let _ = event_tx.send(Line::Event(event.clone()));
        }
    });
    manager.on_error(move |error| {
        let _ = tx.send(Line::Error(error.clone()));
    });

    let mut status = manager.watch_status();
    let mut feed = Feed::new();

    let mut banners = tracker.map(SyncTracker::subscribe);
    let mut shown = tracker.map_or(Indicator::Hidden, SyncTracker::indicator);

    manager.connect().await?;
    write_status(out, output, manager.status(), &manager.status_string())?;
    let _ = status.borrow_and_update();
    if let Some(tracker) = tracker {
        track_connectivity(tracker, manager.status()).await;
    }

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupted, disconnecting");
                manager.disconnect().await;
                break;
            }
            Some(line) = lines.recv() => match line {
                Line::Event(event) => {
                    feed.apply(&event);
                    write_event(out, output, &event)?;
                }
                Line::Error(error) => {
                    write_error(out, output, &error)?;
                    if error.code == codes::RECONNECT_EXHAUSTED {
                        return Err(error.into());
                    }
                }
            },
            changed = status.changed() => {
                if changed.is_err() {
                    return Err(Error::Connection(ConnectionError::Stopped));
                }
                let current = *status.borrow_and_update();
                write_status(out, output, current, &manager.status_string())?;
                if let Some(tracker) = tracker {
                    track_connectivity(tracker, current).await;
                }
            }
            Some(indicator) = next_indicator(&mut banners) => {
                if indicator != shown {
                    shown = indicator;
                    write_indicator(out, output, indicator)?;
                }
            }
        }
    }

    if !output.is_json() {
        writeln!(out, "{} alerts, {} unread", feed.len(), feed.unread_count())?;
    }
    Ok(())
}

/// Connected means online; reconnecting or failed means offline.
async fn track_connectivity(tracker: &SyncTracker, status: ConnectionStatus) {
    let online = match status {
        ConnectionStatus::Connected => true,
        ConnectionStatus::Reconnecting | ConnectionStatus::Error => false,
        ConnectionStatus::Connecting | ConnectionStatus::Disconnected => return,
    };
    if let Err(e) = tracker.set_online(online).await {
        tracing::warn!(error = %e, "failed to refresh queue counts");
    }
}

/// Next indicator from the tracker. Resolves to `None` when there is no
/// tracker or it has gone away.
async fn next_indicator(banners: &mut Option<watch::Receiver<TrackerState>>) -> Option<Indicator> {
    let banners = banners.as_mut()?;
    banners.changed().await.ok()?;
    let indicator = banners.borrow_and_update().indicator;
    Some(indicator)
}

fn write_indicator<W: Write>(out: &mut W, output: OutputArgs, indicator: Indicator) -> Result<()> {
    if output.is_json() {
        let line = match indicator {
            Indicator::Hidden => serde_json::json!({ "indicator": "hidden" }),
            Indicator::Offline { pending } => {
                serde_json::json!({ "indicator": "offline", "pending": pending })
            }
            Indicator::BackOnline => serde_json::json!({ "indicator": "back-online" }),
        };
        writeln!(out, "{}", line)?;
        return Ok(());
    }
    match indicator {
        Indicator::Hidden => {}
        Indicator::Offline { pending } => writeln!(out, "-- offline: {} pending", pending)?,
        Indicator::BackOnline => writeln!(out, "-- back online")?,
    }
    Ok(())
}

fn write_event<W: Write>(out: &mut W, output: OutputArgs, event: &InboundEvent) -> Result<()> {
    if output.is_json() {
        writeln!(out, "{}", serde_json::to_string(event)?)?;
    } else {
        writeln!(out, "{}", format_event(event))?;
    }
    Ok(())
}

fn write_error<W: Write>(out: &mut W, output: OutputArgs, error: &ErrorInfo) -> Result<()> {
    if output.is_json() {
        writeln!(out, "{}", serde_json::json!({ "error": error }))?;
    } else {
        writeln!(out, "error: {}", error)?;
    }
    Ok(())
}

fn write_status<W: Write>(
    out: &mut W,
    output: OutputArgs,
    status: ConnectionStatus,
    text: &str,
) -> Result<()> {
    if output.is_json() {
        writeln!(out, "{}", serde_json::json!({ "status": status.as_str() }))?;
    } else {
        writeln!(out, "-- {}", text)?;
    }
    Ok(())
}

/// One-line text rendering of an inbound event.
pub(crate) fn format_event(event: &InboundEvent) -> String {
    let kind = event.kind().as_str();
    match event {
        InboundEvent::NewItem(item) => {
            format!("{:<13} [{}] {}  {}", kind, item.priority, item.id, item.title)
        }
        InboundEvent::ItemAssigned(item) => {
            let assignee = item.assigned_to.as_deref().unwrap_or("nobody");
            format!(
                "{:<13} [{}] {}  {} -> {}",
                kind, item.priority, item.id, item.title, assignee
            )
        }
        InboundEvent::ItemUpdated(patch) => {
            let mut changed = Vec::new();
            if patch.title.is_some() {
                changed.push("title");
            }
            if patch.priority.is_some() {
                changed.push("priority");
            }
            if patch.read.is_some() {
                changed.push("read");
            }
            if patch.assigned_to.is_some() {
                changed.push("assigned_to");
            }
            if changed.is_empty() {
                format!("{:<13} {}", kind, patch.id)
            } else {
                format!("{:<13} {}  ({})", kind, patch.id, changed.join(", "))
            }
        }
        InboundEvent::ItemDeleted(deleted) => format!("{:<13} {}", kind, deleted.id),
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
