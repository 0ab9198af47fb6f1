// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use crate::cli::{OutputArgs, QueueCommand};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::offline::{
    DrainReport, HttpDrain, JsonlQueue, MutationSender, QueuedMutation, SyncQueueSnapshot,
    SyncTracker, TrackerConfig,
};

use super::open_queue;

/// Result of `queue drain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    #[serde(flatten)]
    pub report: DrainReport,
    pub pruned: usize,
    #[serde(skip)]
    pub snapshot: SyncQueueSnapshot,
}

/// Execute a queue subcommand.
pub async fn run(config: &Config, cmd: QueueCommand) -> Result<()> {
    let mut stdout = std::io::stdout();
    match cmd {
        QueueCommand::Status { output } => {
            let queue = open_queue(config)?;
            write_status(&mut stdout, output, &queue.snapshot()?)
        }
        QueueCommand::Add { method, path, body } => {
            let queue = open_queue(config)?;
            let mutation = add(&queue, &method, &path, body.as_deref())?;
            writeln!(
                stdout,
                "queued {} {} {}",
                mutation.id, mutation.method, mutation.path
            )?;
            Ok(())
        }
        QueueCommand::Drain { prune, output } => {
            let queue = open_queue(config)?;
            let client = config.api_client()?;
            let summary = drain(queue, client, config.tracker_config(), prune).await?;
            write_summary(&mut stdout, output, &summary)
        }
    }
}

/// Parses `body` as JSON and appends the mutation.
pub(crate) fn add(
    queue: &JsonlQueue,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<QueuedMutation> {
    let body = body
        .map(|raw| serde_json::from_str(raw).map_err(|e| Error::InvalidBody(e.to_string())))
        .transpose()?;
    Ok(queue.enqueue(method, path, body)?)
}

/// Runs one sync pass with the tracker forced online.
pub(crate) async fn drain<S>(
    queue: Arc<JsonlQueue>,
    sender: S,
    tracker_config: TrackerConfig,
    prune: bool,
) -> Result<DrainSummary>
where
    S: MutationSender + 'static,
{
    let drain = Arc::new(HttpDrain::new(Arc::clone(&queue), sender));
    let tracker = SyncTracker::new(queue.clone(), drain, tracker_config, true);

    let report = tracker.retry_sync().await?.unwrap_or_default();
    let pruned = if prune { queue.prune_synced()? } else { 0 };
    let snapshot = if pruned > 0 {
        tracker.refresh_counts().await?
    } else {
        tracker.snapshot()
    };
    Ok(DrainSummary {
        report,
        pruned,
        snapshot,
    })
}

pub(crate) fn write_status<W: Write>(
    out: &mut W,
    output: OutputArgs,
    snapshot: &SyncQueueSnapshot,
) -> Result<()> {
    if output.is_json() {
        writeln!(out, "{}", serde_json::to_string(snapshot)?)?;
    } else if snapshot.total_count == 0 {
        writeln!(out, "queue is empty")?;
    } else {
        writeln!(
            out,
            "{} pending, {} total",
            snapshot.pending_count, snapshot.total_count
        )?;
    }
    Ok(())
}

pub(crate) fn write_summary<W: Write>(
    out: &mut W,
    output: OutputArgs,
    summary: &DrainSummary,
) -> Result<()> {
    if output.is_json() {
        writeln!(out, "{}", serde_json::to_string(summary)?)?;
        return Ok(());
    }
    let report = &summary.report;
    writeln!(
        out,
        "sent {}, failed {}, remaining {}",
        report.sent, report.failed, report.remaining
    )?;
    if summary.pruned > 0 {
        writeln!(out, "pruned {} synced", summary.pruned)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
