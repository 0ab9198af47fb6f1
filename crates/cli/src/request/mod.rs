// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request execution with deduplication and retry.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ RequestExecutor  │────►│  DedupCache  │────►│  RequestFn   │
//! │ (state, retries) │◄────│ (in-flight)  │◄────│ (HTTP call)  │
//! └──────────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Each executor owns its [`ExecutionState`]. Executors only share work
//! through a [`DedupCache`], and only while a call is in flight.

mod dedup;
mod executor;
mod key;

pub use dedup::DedupCache;
pub use executor::{
    ApiResponse, Callbacks, ExecutionPhase, ExecutionState, ExecutorBuilder, ExecutorConfig,
    RequestExecutor, RequestFn, RequestFuture,
};
pub use key::{derive_key, request_key};
