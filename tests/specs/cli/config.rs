// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `feedline config` commands.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use yare::parameterized;

fn feedline(config: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("feedline");
    cmd.env_remove("FEEDLINE_TOKEN")
        .env_remove("FEEDLINE_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

fn write_config(temp: &TempDir, content: &str) -> std::path::PathBuf {
    let path = temp.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn show_without_file_prints_defaults() {
    let temp = TempDir::new().unwrap();
    feedline(&temp.path().join("missing.toml"))
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_attempts = 5"))
        .stdout(predicate::str::contains("base_delay_ms = 1000"))
        .stdout(predicate::str::contains("max_retries = 3"))
        .stdout(predicate::str::contains("poll_interval_secs = 30"));
}

#[test]
fn show_reflects_file_values() {
    let temp = TempDir::new().unwrap();
    let path = write_config(
        &temp,
        "[server]\nws_url = \"wss://feed.example/ws\"\n\n[requests]\nmax_retries = 1\n",
    );
    feedline(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ws_url = \"wss://feed.example/ws\""))
        .stdout(predicate::str::contains("max_retries = 1"));
}

#[test]
fn show_redacts_token_from_file() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "[server]\ntoken = \"file-secret\"\n");
    feedline(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("token = \"********\""))
        .stdout(predicate::str::contains("file-secret").not());
}

#[test]
fn show_redacts_token_from_environment() {
    let temp = TempDir::new().unwrap();
    feedline(&temp.path().join("missing.toml"))
        .env("FEEDLINE_TOKEN", "env-secret")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("token = \"********\""))
        .stdout(predicate::str::contains("env-secret").not());
}

#[test]
fn path_prints_explicit_location() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("elsewhere.toml");
    feedline(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.toml"));
}

#[parameterized(
    ws_url_http = { "[server]\nws_url = \"http://feed.example\"\n", "server.ws_url" },
    api_url_ws = { "[server]\napi_url = \"ws://api.example\"\n", "server.api_url" },
    bad_delays = { "[connection]\nbase_delay_ms = 5000\nmax_delay_ms = 10\n", "max_delay_ms" },
    not_toml = { "[server\n", "failed to parse" },
)]
fn invalid_config_fails_with_message(content: &str, expected: &str) {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, content);
    feedline(&path)
        .args(["config", "show"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(expected));
}

#[test]
fn invalid_url_error_has_hint() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "[server]\nws_url = \"feed.example\"\n");
    feedline(&path)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hint: expected a ws:// or wss:// URL"));
}
