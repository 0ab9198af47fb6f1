// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stable identity of a request for deduplication.

use serde::Serialize;
use sha2::{Digest, Sha256};

use fl_core::ErrorInfo;

/// Derives a key from serialized call arguments.
///
/// Arguments are serialized to JSON (field order preserved) and hashed so
/// keys stay short for large payloads. `scope` separates endpoints that
/// happen to take identical arguments.
pub fn derive_key<A: Serialize + ?Sized>(scope: &str, args: &A) -> Result<String, ErrorInfo> {
    let json = serde_json::to_string(args).map_err(ErrorInfo::unknown)?;
    let digest = Sha256::digest(json.as_bytes());
    Ok(format!("{}:{}", scope, hex::encode(&digest[..16])))
}

/// Uses the explicit key if given, otherwise derives one from `args`.
///
/// Both forms are prefixed with `scope`.
pub fn request_key<A: Serialize + ?Sized>(
    explicit: Option<&str>,
    scope: &str,
    args: &A,
) -> Result<String, ErrorInfo> {
    match explicit {
        Some(key) => Ok(format!("{}:{}", scope, key)),
        None => derive_key(scope, args),
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
