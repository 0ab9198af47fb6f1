// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.
//!
//! These structs are used with `#[command(flatten)]` to reduce duplication
//! across commands that accept the same options.

use clap::Args;

use super::OutputFormat;

/// Output format selection.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct OutputArgs {
    /// Output format (text or json)
    #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl OutputArgs {
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

/// Overrides for the `[requests]` config section.
#[derive(Args, Clone, Debug, Default)]
pub struct RetryArgs {
    /// Retries after the first attempt (overrides requests.max_retries)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Base delay between retries in milliseconds (overrides requests.retry_delay_ms)
    #[arg(long, value_name = "MS")]
    pub retry_delay: Option<u64>,

    /// Do not share the call with identical in-flight calls
    #[arg(long)]
    pub no_dedup: bool,
}
