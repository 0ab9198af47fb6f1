// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `feedline get` command.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feedline(config: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("feedline");
    cmd.env_remove("FEEDLINE_TOKEN")
        .arg("--config")
        .arg(config);
    cmd
}

fn config_for(temp: &TempDir, api_url: &str) -> std::path::PathBuf {
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            "[server]\napi_url = \"{}\"\n\n[requests]\nretry_delay_ms = 10\n",
            api_url
        ),
    )
    .unwrap();
    path
}

async fn mount(
    server: &MockServer,
    route: &str,
    status: u16,
    body: serde_json::Value,
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn get_prints_data() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount(&server, "/alerts", 200, json!([{"id": "a-1"}]), 1).await;

    feedline(&config_for(&temp, &server.uri()))
        .args(["get", "/alerts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"a-1\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn get_retries_server_errors() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount(&server, "/alerts", 503, json!({"message": "busy"}), 1).await;
    mount(&server, "/alerts", 200, json!({"ok": true}), 1).await;

    feedline(&config_for(&temp, &server.uri()))
        .args(["get", "/alerts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\": true"));
}

#[tokio::test(flavor = "multi_thread")]
async fn get_gives_up_after_configured_retries() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount(&server, "/alerts", 500, json!({"message": "down"}), 3).await;

    feedline(&config_for(&temp, &server.uri()))
        .args(["get", "/alerts", "--retries", "2", "--retry-delay", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("RETRIES_EXHAUSTED"));
}

#[tokio::test(flavor = "multi_thread")]
async fn get_reports_client_errors_without_retry() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount(&server, "/alerts/missing", 404, json!({"message": "no such alert"}), 1).await;

    feedline(&config_for(&temp, &server.uri()))
        .args(["get", "/alerts/missing"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("HTTP_ERROR"));
}

#[test]
fn get_unreachable_with_no_retries_fails() {
    let temp = TempDir::new().unwrap();
    feedline(&config_for(&temp, "http://127.0.0.1:9"))
        .args(["get", "/alerts", "--retries", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("request failed"));
}

#[test]
fn get_without_api_url_fails_with_hint() {
    let temp = TempDir::new().unwrap();
    feedline(&temp.path().join("missing.toml"))
        .args(["get", "/alerts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server.api_url is not set"))
        .stderr(predicate::str::contains("hint:"));
}
