// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent queue of mutations made while offline.
//!
//! Uses JSONL format for durability - each mutation is written as a single
//! line and fsynced immediately. Appends and status rewrites take the same
//! exclusive lock file, so a concurrent `queue add` cannot interleave with a
//! drain.

use std::fs::{self, File, OpenOptions};
use std::future::Future;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use fl_core::ErrorInfo;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A line in the queue file could not be parsed.
    #[error("corrupt queue entry at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("invalid HTTP method '{0}'\n  hint: use GET, POST, PUT, PATCH or DELETE")]
    InvalidMethod(String),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Methods accepted for queued mutations.
pub const METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Pending,
    Synced,
    Failed,
}

/// One buffered write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    pub id: String,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    pub status: MutationStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ErrorInfo>,
    pub queued_at: DateTime<Utc>,
}

impl QueuedMutation {
    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }
}

/// Pending and total counts of the persistent queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncQueueSnapshot {
    pub pending_count: usize,
    pub total_count: usize,
}

impl SyncQueueSnapshot {
    pub fn from_items(items: &[QueuedMutation]) -> Self {
        SyncQueueSnapshot {
            pending_count: items.iter().filter(|m| m.is_pending()).count(),
            total_count: items.len(),
        }
    }
}

/// Read side of the persistent queue, as seen by the sync tracker.
pub trait PendingQueue: Send + Sync {
    fn pending_items(
        &self,
    ) -> Pin<Box<dyn Future<Output = QueueResult<Vec<QueuedMutation>>> + Send + '_>>;

    fn all_items(&self) -> Pin<Box<dyn Future<Output = QueueResult<Vec<QueuedMutation>>> + Send + '_>>;
}

/// JSONL-backed queue, one mutation per line.
pub struct JsonlQueue {
    path: PathBuf,
}

impl JsonlQueue {
    /// Create or open a queue at the given path.
    pub fn open(path: &Path) -> QueueResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Ensure the file exists (create if not)
        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(JsonlQueue {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a pending mutation. It is persisted before this returns.
    pub fn enqueue(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> QueueResult<QueuedMutation> {
        let method = method.to_ascii_uppercase();
        if !METHODS.contains(&method.as_str()) {
            return Err(QueueError::InvalidMethod(method));
        }

        let queued_at = Utc::now();
        let mutation = QueuedMutation {
            id: mutation_id(&method, path, body.as_ref(), queued_at),
            method,
            path: path.to_string(),
            body,
            status: MutationStatus::Pending,
            attempts: 0,
            last_error: None,
            queued_at,
        };

        let json = serde_json::to_string(&mutation)?;
        let _lock = self.lock()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;

        tracing::debug!(id = %mutation.id, method = %mutation.method, path = %mutation.path, "queued mutation");
        Ok(mutation)
    }

    /// Read every mutation in queue order.
    pub fn load(&self) -> QueueResult<Vec<QueuedMutation>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut items = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let item = serde_json::from_str(&line).map_err(|e| QueueError::Corrupt {
                line: index + 1,
                reason: e.to_string(),
            })?;
            items.push(item);
        }

        Ok(items)
    }

    pub fn snapshot(&self) -> QueueResult<SyncQueueSnapshot> {
        Ok(SyncQueueSnapshot::from_items(&self.load()?))
    }

    /// Marks a mutation as delivered. Returns false if the id is unknown.
    pub fn mark_synced(&self, id: &str) -> QueueResult<bool> {
        self.update(id, |m| {
            m.status = MutationStatus::Synced;
            m.attempts += 1;
            m.last_error = None;
        })
    }

    /// Marks a mutation as permanently rejected.
    pub fn mark_failed(&self, id: &str, error: &ErrorInfo) -> QueueResult<bool> {
        self.update(id, |m| {
            m.status = MutationStatus::Failed;
            m.attempts += 1;
            m.last_error = Some(error.clone());
        })
    }

    /// Records a transient failure; the mutation stays pending.
    pub fn record_attempt(&self, id: &str, error: &ErrorInfo) -> QueueResult<bool> {
        self.update(id, |m| {
            m.attempts += 1;
            m.last_error = Some(error.clone());
        })
    }

    /// Drops synced mutations from the file. Returns how many were removed.
    pub fn prune_synced(&self) -> QueueResult<usize> {
        let _lock = self.lock()?;
        let items = self.load()?;
        let before = items.len();
        let kept: Vec<_> = items
            .into_iter()
            .filter(|m| m.status != MutationStatus::Synced)
            .collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.rewrite(&kept)?;
        }
        Ok(removed)
    }

    fn update(&self, id: &str, change: impl FnOnce(&mut QueuedMutation)) -> QueueResult<bool> {
        let _lock = self.lock()?;
        let mut items = self.load()?;
        let Some(item) = items.iter_mut().find(|m| m.id == id) else {
            return Ok(false);
        };
        change(item);
        self.rewrite(&items)?;
        Ok(true)
    }

    /// Rewrite the file with `items`, replacing it atomically.
    fn rewrite(&self, items: &[QueuedMutation]) -> QueueResult<()> {
        let tmp = self.path.with_extension("jsonl.tmp");
        let mut file = File::create(&tmp)?;
        for item in items {
            let json = serde_json::to_string(item)?;
            writeln!(file, "{}", json)?;
        }
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Exclusive lock held for the duration of a read-modify-write.
    fn lock(&self) -> QueueResult<QueueLock> {
        let lock_path = self.path.with_extension("jsonl.lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;
        file.lock_exclusive()?;
        Ok(QueueLock(file))
    }
}

struct QueueLock(File);

impl Drop for QueueLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl PendingQueue for JsonlQueue {
    fn pending_items(
        &self,
    ) -> Pin<Box<dyn Future<Output = QueueResult<Vec<QueuedMutation>>> + Send + '_>> {
        Box::pin(async move {
            let mut items = self.load()?;
            items.retain(QueuedMutation::is_pending);
            Ok(items)
        })
    }

    fn all_items(&self) -> Pin<Box<dyn Future<Output = QueueResult<Vec<QueuedMutation>>> + Send + '_>> {
        Box::pin(async move { self.load() })
    }
}

fn mutation_id(
    method: &str,
    path: &str,
    body: Option<&serde_json::Value>,
    queued_at: DateTime<Utc>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(path.as_bytes());
    if let Some(body) = body {
        hasher.update(body.to_string().as_bytes());
    }
    hasher.update(
        queued_at
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes(),
    );
    // Distinguish identical writes queued within the same clock tick
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(next_sequence().to_le_bytes());
    format!("m-{}", hex::encode(&hasher.finalize()[..6]))
}

fn next_sequence() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
