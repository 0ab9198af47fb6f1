// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline/sync status tracking.
//!
//! Mirrors a connectivity signal, keeps the pending/total counts of the
//! persistent queue fresh, and runs drains on request. State is published on
//! a `watch` channel for whatever renders the status indicator.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::drain::{Drain, DrainReport};
use super::queue::{PendingQueue, QueueError, SyncQueueSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("could not read offline queue: {0}")]
    Queue(#[from] QueueError),

    #[error("drain failed: {0}")]
    Drain(#[source] QueueError),
}

/// What the status indicator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Hidden,
    /// Offline with unsent work. Stays until connectivity returns.
    Offline { pending: usize },
    /// Connectivity just returned. Clears itself after the banner duration.
    BackOnline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    pub online: bool,
    pub syncing: bool,
    pub snapshot: SyncQueueSnapshot,
    pub indicator: Indicator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub success_banner: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            success_banner: Duration::from_secs(3),
        }
    }
}

struct Inner {
    queue: Arc<dyn PendingQueue>,
    drain: Arc<dyn Drain>,
    config: TrackerConfig,
    state: watch::Sender<TrackerState>,
    syncing: AtomicBool,
    /// Bumped on every return online; a banner only clears its own generation.
    banner_generation: AtomicU64,
    cancel_token: CancellationToken,
}

/// Tracks connectivity and the local queue. Cloning shares the tracker.
#[derive(Clone)]
pub struct SyncTracker {
    inner: Arc<Inner>,
}

impl SyncTracker {
    pub fn new(
        queue: Arc<dyn PendingQueue>,
        drain: Arc<dyn Drain>,
        config: TrackerConfig,
        online: bool,
    ) -> Self {
        let (state, _) = watch::channel(TrackerState {
            online,
            syncing: false,
            snapshot: SyncQueueSnapshot::default(),
            indicator: Indicator::Hidden,
        });
        SyncTracker {
            inner: Arc::new(Inner {
                queue,
                drain,
                config,
                state,
                syncing: AtomicBool::new(false),
                banner_generation: AtomicU64::new(0),
                cancel_token: CancellationToken::new(),
            }),
        }
    }

    /// Spawns the poll loop: one refresh now, then one per poll interval.
    pub fn start(&self) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tracker.inner.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = tracker.inner.cancel_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = tracker.refresh_counts().await {
                            tracing::warn!(error = %e, "failed to refresh queue counts");
                        }
                    }
                }
            }
        })
    }

    /// Stops the poll loop and any pending banner timer.
    pub fn stop(&self) {
        self.inner.cancel_token.cancel();
    }

    pub fn is_online(&self) -> bool {
        self.inner.state.borrow().online
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> SyncQueueSnapshot {
        self.inner.state.borrow().snapshot
    }

    pub fn indicator(&self) -> Indicator {
        self.inner.state.borrow().indicator
    }

    pub fn state(&self) -> TrackerState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.inner.state.subscribe()
    }

    /// Feeds a connectivity transition. Repeats of the current value are ignored.
    pub async fn set_online(&self, online: bool) -> Result<SyncQueueSnapshot, TrackerError> {
        let changed = self.inner.state.send_if_modified(|state| {
            if state.online == online {
                return false;
            }
            state.online = online;
            state.indicator = if online {
                Indicator::BackOnline
            } else {
                offline_indicator(&state.snapshot)
            };
            true
        });
        if !changed {
            return Ok(self.snapshot());
        }

        tracing::info!(online, "connectivity changed");
        if online {
            self.schedule_banner_clear();
        }
        self.refresh_counts().await
    }

    /// Re-reads pending and total counts from the queue.
    pub async fn refresh_counts(&self) -> Result<SyncQueueSnapshot, TrackerError> {
        let pending_count = self.inner.queue.pending_items().await?.len();
        let total_count = self.inner.queue.all_items().await?.len();
        let snapshot = SyncQueueSnapshot {
            pending_count,
            total_count: total_count.max(pending_count),
        };

        self.inner.state.send_if_modified(|state| {
            let before = state.clone();
            state.snapshot = snapshot;
            if !state.online {
                state.indicator = offline_indicator(&snapshot);
            }
            *state != before
        });
        tracing::debug!(pending_count, total_count, "queue counts refreshed");
        Ok(snapshot)
    }

    /// Runs the drain, then refreshes counts.
    ///
    /// Returns `Ok(None)` without draining when offline or when another
    /// drain is already running.
    pub async fn retry_sync(&self) -> Result<Option<DrainReport>, TrackerError> {
        if !self.is_online() {
            tracing::debug!("offline, not draining");
            return Ok(None);
        }
        let Some(_guard) = SyncingGuard::acquire(&self.inner) else {
            tracing::debug!("drain already in progress");
            return Ok(None);
        };

        let drained = self.inner.drain.drain().await.map_err(TrackerError::Drain);
        let refreshed = self.refresh_counts().await;
        let report = drained?;
        refreshed?;
        Ok(Some(report))
    }

    fn schedule_banner_clear(&self) {
        let generation = self.inner.banner_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.cancel_token.cancelled() => {}
                _ = tokio::time::sleep(inner.config.success_banner) => {
                    if inner.banner_generation.load(Ordering::Acquire) == generation {
                        inner.state.send_if_modified(|state| {
                            if state.indicator == Indicator::BackOnline {
                                state.indicator = Indicator::Hidden;
                                true
                            } else {
                                false
                            }
                        });
                    }
                }
            }
        });
    }
}

fn offline_indicator(snapshot: &SyncQueueSnapshot) -> Indicator {
    if snapshot.pending_count > 0 {
        Indicator::Offline {
            pending: snapshot.pending_count,
        }
    } else {
        Indicator::Hidden
    }
}

/// Holds the `syncing` flag for the duration of one drain.
struct SyncingGuard<'a> {
    inner: &'a Inner,
}

impl<'a> SyncingGuard<'a> {
    fn acquire(inner: &'a Inner) -> Option<Self> {
        inner
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        inner.state.send_modify(|state| state.syncing = true);
        Some(SyncingGuard { inner })
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.inner.syncing.store(false, Ordering::Release);
        self.inner.state.send_modify(|state| state.syncing = false);
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
