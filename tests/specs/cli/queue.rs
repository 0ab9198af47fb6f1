// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `feedline queue` commands.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;
use yare::parameterized;

/// Temp dir with a config pointing the queue inside it.
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self::with_server("")
    }

    /// `server` is extra TOML placed under `[server]`.
    fn with_server(server: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let queue = temp.path().join("data").join("queue.jsonl");
        let config = format!(
            "[server]\n{}\n[offline]\nqueue_path = {:?}\n",
            server,
            queue.to_str().unwrap()
        );
        std::fs::write(temp.path().join("config.toml"), config).unwrap();
        Workspace { temp }
    }

    fn queue_path(&self) -> PathBuf {
        self.temp.path().join("data").join("queue.jsonl")
    }

    fn feedline(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("feedline");
        cmd.env_remove("FEEDLINE_TOKEN")
            .arg("--config")
            .arg(self.temp.path().join("config.toml"));
        cmd
    }

    fn add(&self, method: &str, path: &str) {
        self.feedline()
            .args(["queue", "add", method, path])
            .assert()
            .success();
    }
}

#[test]
fn status_of_new_queue_is_empty() {
    let ws = Workspace::new();
    ws.feedline()
        .args(["queue", "status"])
        .assert()
        .success()
        .stdout("queue is empty\n");
}

#[test]
fn add_persists_one_line_per_mutation() {
    let ws = Workspace::new();
    ws.feedline()
        .args(["queue", "add", "post", "/alerts/1/read"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^queued m-[0-9a-f]{12} POST /alerts/1/read\n$").unwrap());
    ws.add("DELETE", "/alerts/2");

    let content = std::fs::read_to_string(ws.queue_path()).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["method"], "POST");
    assert_eq!(lines[0]["status"], "pending");
    assert_eq!(lines[1]["path"], "/alerts/2");
}

#[test]
fn status_counts_pending_items() {
    let ws = Workspace::new();
    ws.add("POST", "/alerts/1/read");
    ws.add("POST", "/alerts/2/read");

    ws.feedline()
        .args(["queue", "status"])
        .assert()
        .success()
        .stdout("2 pending, 2 total\n");

    ws.feedline()
        .args(["queue", "status", "-o", "json"])
        .assert()
        .success()
        .stdout("{\"pending_count\":2,\"total_count\":2}\n");
}

#[test]
fn add_with_json_body() {
    let ws = Workspace::new();
    ws.feedline()
        .args(["queue", "add", "PATCH", "/alerts/3", "--body", r#"{"read":true}"#])
        .assert()
        .success();

    let content = std::fs::read_to_string(ws.queue_path()).unwrap();
    let entry: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(entry["body"], serde_json::json!({"read": true}));
}

#[parameterized(
    unknown_method = { &["queue", "add", "FETCH", "/alerts"], "invalid HTTP method" },
    bad_body = { &["queue", "add", "POST", "/alerts", "--body", "{nope"], "invalid JSON body" },
)]
fn add_rejects_bad_input(args: &[&str], expected: &str) {
    let ws = Workspace::new();
    ws.feedline()
        .args(args)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(expected));
    assert!(!ws.queue_path().exists() || std::fs::read_to_string(ws.queue_path()).unwrap().is_empty());
}

#[test]
fn drain_requires_api_url() {
    let ws = Workspace::new();
    ws.add("POST", "/alerts/1/read");
    ws.feedline()
        .args(["queue", "drain"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server.api_url is not set"));
}

#[test]
fn drain_of_empty_queue_reports_nothing_sent() {
    let ws = Workspace::with_server("api_url = \"http://127.0.0.1:9\"");
    ws.feedline()
        .args(["queue", "drain"])
        .assert()
        .success()
        .stdout("sent 0, failed 0, remaining 0\n");
}

#[test]
fn drain_against_unreachable_api_keeps_items_pending() {
    let ws = Workspace::with_server("api_url = \"http://127.0.0.1:9\"");
    ws.add("POST", "/alerts/1/read");
    ws.add("POST", "/alerts/2/read");

    ws.feedline()
        .args(["queue", "drain", "-o", "json"])
        .assert()
        .success()
        .stdout("{\"sent\":0,\"failed\":0,\"remaining\":2,\"pruned\":0}\n");

    ws.feedline()
        .args(["queue", "status"])
        .assert()
        .success()
        .stdout("2 pending, 2 total\n");
}
