// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fl-core.
//!
//! Two shapes live here:
//! - [`Error`] is the crate's own failure type (parsing, invalid values).
//! - [`ErrorInfo`] is the normalized `{code, message}` shape that crosses the
//!   public boundary of the request and connection layers. Callers read it
//!   from state instead of catching it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All possible errors that can occur in fl-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid priority: '{0}'\n  hint: valid priorities are: low, medium, high, critical")]
    InvalidPriority(String),

    #[error("invalid event kind: '{0}'\n  hint: valid kinds are: new-item, item-updated, item-assigned, item-deleted")]
    InvalidEventKind(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for fl-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes carried by [`ErrorInfo`].
pub mod codes {
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const HTTP_ERROR: &str = "HTTP_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const AUTH_ERROR: &str = "AUTH_ERROR";
    pub const MALFORMED_RESPONSE: &str = "MALFORMED_RESPONSE";
    pub const RETRIES_EXHAUSTED: &str = "RETRIES_EXHAUSTED";
    pub const RECONNECT_EXHAUSTED: &str = "RECONNECT_EXHAUSTED";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
}

/// Coarse classification of an [`ErrorInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Timeouts, 5xx, transport drops. Retried automatically.
    Transient,
    /// 4xx, validation, auth, malformed responses. Never retried.
    Terminal,
    /// Retries or reconnect attempts ran out.
    Exhausted,
    /// Anything that did not conform to a known shape.
    Unknown,
}

/// Normalized error surfaced to callers and observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    /// HTTP status, when the error came from an HTTP response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorInfo {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(codes::TIMEOUT, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(codes::NETWORK_ERROR, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(codes::MALFORMED_RESPONSE, message)
    }

    /// Coerces an arbitrary failure into `UNKNOWN_ERROR`.
    pub fn unknown(message: impl fmt::Display) -> Self {
        Self::new(codes::UNKNOWN_ERROR, message.to_string())
    }

    /// Builds an error from an HTTP status code.
    ///
    /// 408 maps to `TIMEOUT`, 401/403 to `AUTH_ERROR`, 422 to
    /// `VALIDATION_ERROR`, other 4xx to `HTTP_ERROR` and 5xx to `SERVER_ERROR`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            408 => codes::TIMEOUT,
            401 | 403 => codes::AUTH_ERROR,
            422 => codes::VALIDATION_ERROR,
            500..=599 => codes::SERVER_ERROR,
            _ => codes::HTTP_ERROR,
        };
        ErrorInfo {
            code: code.to_string(),
            message: message.into(),
            status: Some(status),
        }
    }

    /// Wraps the last failure of a retry loop that gave up.
    pub fn retries_exhausted(attempts: u32, last: &ErrorInfo) -> Self {
        Self::new(
            codes::RETRIES_EXHAUSTED,
            format!("gave up after {} attempts: {}", attempts, last.message),
        )
    }

    /// Terminal error for a connection that ran out of reconnect attempts.
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self::new(
            codes::RECONNECT_EXHAUSTED,
            format!("unable to reconnect after {} attempts", attempts),
        )
    }

    pub fn class(&self) -> ErrorClass {
        match self.code.as_str() {
            codes::TIMEOUT | codes::NETWORK_ERROR | codes::SERVER_ERROR => ErrorClass::Transient,
            codes::HTTP_ERROR
            | codes::VALIDATION_ERROR
            | codes::AUTH_ERROR
            | codes::MALFORMED_RESPONSE => ErrorClass::Terminal,
            codes::RETRIES_EXHAUSTED | codes::RECONNECT_EXHAUSTED => ErrorClass::Exhausted,
            _ => match self.status {
                Some(500..=599) => ErrorClass::Transient,
                Some(400..=499) => ErrorClass::Terminal,
                _ => ErrorClass::Unknown,
            },
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.class() == ErrorClass::Exhausted
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorInfo {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
