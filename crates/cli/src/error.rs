// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use fl_core::ErrorInfo;

use crate::connection::ConnectionError;
use crate::offline::{QueueError, TrackerError};

/// All possible errors that can occur in the feedline library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("{setting} is not set\n  hint: add it to the config file or pass it on the command line")]
    MissingSetting { setting: &'static str },

    #[error("invalid URL for {setting}: '{url}'\n  hint: expected a {expected} URL")]
    InvalidUrl {
        setting: &'static str,
        url: String,
        expected: &'static str,
    },

    #[error("invalid JSON body: {0}\n  hint: pass a JSON document, e.g. --body '{{\"read\": true}}'")]
    InvalidBody(String),

    #[error("request failed: {0}")]
    Request(ErrorInfo),

    #[error("http client error: {0}")]
    Http(String),

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("unable to reconnect: {0}\n  hint: check the server and run the command again")]
    GaveUp(ErrorInfo),

    #[error("offline queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("sync error: {0}")]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Core(#[from] fl_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for feedline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<ErrorInfo> for Error {
    fn from(info: ErrorInfo) -> Self {
        if info.is_exhausted() && info.code == fl_core::codes::RECONNECT_EXHAUSTED {
            Error::GaveUp(info)
        } else {
            Error::Request(info)
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
