// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replays queued mutations to the backend.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use fl_core::{is_retryable, ErrorInfo};

use super::queue::{JsonlQueue, QueueError, QueuedMutation};
use crate::http::ApiClient;
use crate::request::ApiResponse;

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub sent: usize,
    pub failed: usize,
    /// Still pending after the pass.
    pub remaining: usize,
}

/// The drain action the sync tracker triggers.
pub trait Drain: Send + Sync {
    fn drain(&self) -> Pin<Box<dyn Future<Output = Result<DrainReport, QueueError>> + Send + '_>>;
}

/// Delivers one queued mutation.
pub trait MutationSender: Send + Sync {
    fn send<'a>(
        &'a self,
        mutation: &'a QueuedMutation,
    ) -> Pin<Box<dyn Future<Output = ApiResponse<Value>> + Send + 'a>>;
}

impl MutationSender for ApiClient {
    fn send<'a>(
        &'a self,
        mutation: &'a QueuedMutation,
    ) -> Pin<Box<dyn Future<Output = ApiResponse<Value>> + Send + 'a>> {
        Box::pin(async move {
            let method = match Method::from_bytes(mutation.method.as_bytes()) {
                Ok(method) => method,
                Err(e) => return ApiResponse::err(ErrorInfo::unknown(e)),
            };
            self.request(method, &mutation.path, mutation.body.as_ref())
                .await
        })
    }
}

/// Drains a [`JsonlQueue`] through a [`MutationSender`] in queue order.
///
/// Success marks the mutation synced. A terminal failure marks it failed
/// and moves on. A transient failure stops the pass, leaving it and
/// everything after it pending.
pub struct HttpDrain<S = ApiClient> {
    queue: Arc<JsonlQueue>,
    sender: S,
}

impl<S: MutationSender> HttpDrain<S> {
    pub fn new(queue: Arc<JsonlQueue>, sender: S) -> Self {
        Self { queue, sender }
    }

    pub async fn run(&self) -> Result<DrainReport, QueueError> {
        let pending: Vec<_> = self
            .queue
            .load()?
            .into_iter()
            .filter(QueuedMutation::is_pending)
            .collect();
        let mut report = DrainReport {
            remaining: pending.len(),
            ..DrainReport::default()
        };
        tracing::info!(pending = pending.len(), "draining offline queue");

        for mutation in &pending {
            match self.sender.send(mutation).await.into_result() {
                Ok(_) => {
                    self.queue.mark_synced(&mutation.id)?;
                    report.sent += 1;
                    report.remaining -= 1;
                }
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(id = %mutation.id, error = %e, "transient failure, stopping drain");
                    self.queue.record_attempt(&mutation.id, &e)?;
                    break;
                }
                Err(e) => {
                    tracing::warn!(id = %mutation.id, error = %e, "mutation rejected");
                    self.queue.mark_failed(&mutation.id, &e)?;
                    report.failed += 1;
                    report.remaining -= 1;
                }
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            remaining = report.remaining,
            "drain finished"
        );
        Ok(report)
    }
}

impl<S: MutationSender> Drain for HttpDrain<S> {
    fn drain(&self) -> Pin<Box<dyn Future<Output = Result<DrainReport, QueueError>> + Send + '_>> {
        Box::pin(self.run())
    }
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
