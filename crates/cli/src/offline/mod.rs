// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline buffering and sync status.
//!
//! ```text
//! ┌─────────────┐  counts   ┌─────────────┐
//! │ SyncTracker │◄──────────│ JsonlQueue  │◄──── queue add
//! │             │           │  (JSONL)    │
//! └──────┬──────┘           └──────▲──────┘
//!        │ retry_sync              │ mark synced / failed
//!        ▼                         │
//! ┌─────────────┐   replay   ┌─────┴───────┐
//! │  HttpDrain  │───────────►│  ApiClient  │
//! └─────────────┘            └─────────────┘
//! ```

mod drain;
mod queue;
mod tracker;

pub use drain::{Drain, DrainReport, HttpDrain, MutationSender};
pub use queue::{
    JsonlQueue, MutationStatus, PendingQueue, QueueError, QueueResult, QueuedMutation,
    SyncQueueSnapshot, METHODS,
};
pub use tracker::{Indicator, SyncTracker, TrackerConfig, TrackerError, TrackerState};
