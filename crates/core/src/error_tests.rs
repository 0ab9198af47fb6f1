// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    request_timeout = { 408, codes::TIMEOUT, ErrorClass::Transient },
    unauthorized = { 401, codes::AUTH_ERROR, ErrorClass::Terminal },
    forbidden = { 403, codes::AUTH_ERROR, ErrorClass::Terminal },
    unprocessable = { 422, codes::VALIDATION_ERROR, ErrorClass::Terminal },
    not_found = { 404, codes::HTTP_ERROR, ErrorClass::Terminal },
    internal = { 500, codes::SERVER_ERROR, ErrorClass::Transient },
    bad_gateway = { 502, codes::SERVER_ERROR, ErrorClass::Transient },
)]
fn from_status_classifies(status: u16, code: &str, class: ErrorClass) {
    let err = ErrorInfo::from_status(status, "boom");
    assert_eq!(err.code, code);
    assert_eq!(err.status, Some(status));
    assert_eq!(err.class(), class);
}

#[test]
fn unknown_code_falls_back_to_status() {
    let mut err = ErrorInfo::new("WEIRD", "x");
    assert_eq!(err.class(), ErrorClass::Unknown);

    err.status = Some(503);
    assert_eq!(err.class(), ErrorClass::Transient);

    err.status = Some(409);
    assert_eq!(err.class(), ErrorClass::Terminal);
}

#[test]
fn unknown_coerces_display() {
    let err = ErrorInfo::unknown("something odd");
    assert_eq!(err.code, codes::UNKNOWN_ERROR);
    assert_eq!(err.message, "something odd");
    assert_eq!(err.class(), ErrorClass::Unknown);
}

#[test]
fn exhaustion_errors_are_distinct() {
    let last = ErrorInfo::timeout("slow");
    let err = ErrorInfo::retries_exhausted(3, &last);
    assert!(err.is_exhausted());
    assert!(err.message.contains("3 attempts"));
    assert!(err.message.contains("slow"));

    assert!(ErrorInfo::reconnect_exhausted(5).is_exhausted());
}

#[test]
fn error_info_serializes_without_empty_status() {
    let json = serde_json::to_string(&ErrorInfo::network("down")).unwrap();
    assert_eq!(json, r#"{"code":"NETWORK_ERROR","message":"down"}"#);

    let parsed: ErrorInfo = serde_json::from_str(r#"{"code":"X","message":"y"}"#).unwrap();
    assert_eq!(parsed.status, None);
}

#[test]
fn error_display_contains_hint() {
    let err = Error::InvalidPriority("urgent".into());
    assert!(err.to_string().contains("urgent"));
    assert!(err.to_string().contains("critical"));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<()>("invalid").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
}
