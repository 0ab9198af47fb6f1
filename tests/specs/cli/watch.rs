// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `feedline watch` command.
//!
//! A live server is exercised by the connection manager's unit tests; these
//! cover the paths that end without one.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn feedline(config: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("feedline");
    cmd.env_remove("FEEDLINE_TOKEN")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn watch_without_ws_url_fails() {
    let temp = TempDir::new().unwrap();
    feedline(&temp.path().join("missing.toml"))
        .arg("watch")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("server.ws_url is not set"));
}

#[test]
fn watch_disabled_exits_cleanly() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        "[server]\nws_url = \"ws://127.0.0.1:9/ws\"\n\n[connection]\nenabled = false\n",
    )
    .unwrap();
    feedline(&path)
        .arg("watch")
        .assert()
        .success()
        .stdout(predicate::str::contains("push channel disabled"));
}

#[test]
fn watch_unreachable_server_fails_without_retrying() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[server]\nws_url = \"ws://127.0.0.1:9/ws\"\n").unwrap();
    feedline(&path)
        .arg("watch")
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("connection error"));
}

#[test]
fn watch_rejects_unknown_kind() {
    let temp = TempDir::new().unwrap();
    feedline(&temp.path().join("missing.toml"))
        .args(["watch", "--kind", "item-archived"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid event kind"));
}
