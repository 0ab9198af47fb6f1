// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fl_core::EventKind;

pub use args::{OutputArgs, RetryArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_kind(s: &str) -> Result<EventKind, String> {
    s.parse().map_err(|e: fl_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "feedline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live alert feed client with retries, reconnects, and an offline queue")]
#[command(
    long_about = "Live alert feed client.\n\n\
    Follows the push channel with automatic reconnects, runs API calls with retries \
    and deduplication, and buffers mutations locally while offline."
)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/feedline/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log at debug level (FEEDLINE_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Follow the live alert feed
    #[command(after_help = "\
Examples:
  feedline watch                          Follow the feed as the configured user
  feedline watch --user agent-7           Subscribe as a different user
  feedline watch --kind new-item          Only print new alerts
  feedline watch -o json                  One JSON object per event")]
    Watch {
        /// Subscribe as this user (overrides server.user_id)
        #[arg(long, value_parser = non_empty_string)]
        user: Option<String>,

        /// Only print these event kinds (repeatable)
        #[arg(long = "kind", value_parser = parse_kind)]
        kinds: Vec<EventKind>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch an API path with retries
    #[command(after_help = "\
Examples:
  feedline get /alerts                    Fetch with the configured retry policy
  feedline get /alerts --retries 0        Single attempt
  feedline get /alerts/42 --no-dedup      Do not join an identical in-flight call")]
    #[command(arg_required_else_help = true)]
    Get {
        /// API path, relative to server.api_url
        #[arg(value_parser = non_empty_string)]
        path: String,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Inspect or drain the offline mutation queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Offline queue commands.
#[derive(Subcommand)]
pub enum QueueCommand {
    /// Show pending and total mutation counts
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Queue a mutation for later delivery
    #[command(after_help = "\
Examples:
  feedline queue add POST /alerts/42/read
  feedline queue add patch /alerts/42 --body '{\"read\": true}'")]
    #[command(arg_required_else_help = true)]
    Add {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// API path, relative to server.api_url
        #[arg(value_parser = non_empty_string)]
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },

    /// Send pending mutations to the API
    Drain {
        /// Remove synced entries from the queue file afterwards
        #[arg(long)]
        prune: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Configuration management commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (token redacted)
    Show,

    /// Print the config file location
    Path,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
