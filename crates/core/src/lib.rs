// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fl-core: Shared types for the feedline alert feed
//!
//! This crate holds the pure parts of the real-time delivery layer: the
//! alert data model, push-channel wire messages, the normalized error shape,
//! and the retry/backoff policy. It performs no I/O and needs no runtime.

pub mod error;
pub mod event;
pub mod feed;
pub mod item;
pub mod protocol;
pub mod retry;

pub use error::{codes, Error, ErrorClass, ErrorInfo, Result};
pub use event::{EventKind, InboundEvent};
pub use feed::{Applied, Feed};
pub use item::{DeletedItem, Item, ItemId, PartialItem, Priority};
pub use protocol::{ClientMessage, ServerMessage};
pub use retry::{
    compute_delay, compute_delay_capped, is_retryable, Backoff, BackoffPolicy, RetryAttempt,
};
