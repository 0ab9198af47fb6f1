// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight request deduplication.
//!
//! Maps a request key to the shared outcome of the one execution currently
//! running for it. Entries exist only while that execution is in flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use fl_core::ErrorInfo;

use crate::lock;

/// Outcome of a deduplicated request, cloneable across waiters.
pub type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T, ErrorInfo>>>;

/// Cache of in-flight requests keyed by request identity.
///
/// Cloning the cache clones a handle; all clones see the same entries.
pub struct DedupCache<T> {
    inflight: Arc<Mutex<HashMap<String, SharedOutcome<T>>>>,
}

impl<T> Clone for DedupCache<T> {
    fn clone(&self) -> Self {
        DedupCache {
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<T> Default for DedupCache<T> {
    fn default() -> Self {
        DedupCache {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> DedupCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the in-flight execution for `key`, or starts one with `factory`.
    ///
    /// The check and the insert happen under one lock, so two callers can
    /// never both start work for the same key. The work runs on its own task
    /// and removes its entry when it settles, even if every waiter has gone.
    pub fn acquire<F, Fut>(&self, key: &str, factory: F) -> SharedOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ErrorInfo>> + Send + 'static,
    {
        let mut inflight = lock(&self.inflight);
        if let Some(existing) = inflight.get(key) {
            tracing::debug!(key, "joining in-flight request");
            return existing.clone();
        }

        let work = factory();
        let entries = Arc::clone(&self.inflight);
        let owned_key = key.to_string();
        let handle = tokio::spawn(async move {
            let outcome = work.await;
            lock(&entries).remove(&owned_key);
            outcome
        });

        let shared = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(ErrorInfo::unknown(format!("request task failed: {}", e))),
            }
        }
        .boxed()
        .shared();

        inflight.insert(key.to_string(), shared.clone());
        shared
    }

    /// Whether a request for `key` is currently in flight.
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.inflight).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.inflight).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
