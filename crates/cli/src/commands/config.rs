// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::error::{Error, Result};

/// Execute a config subcommand.
pub fn run(config: &Config, explicit_path: Option<&Path>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            print!("{}", show(config)?);
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", config_path(explicit_path)?.display());
            Ok(())
        }
    }
}

/// Effective configuration as TOML with the token masked.
pub(crate) fn show(config: &Config) -> Result<String> {
    config.redacted().to_toml()
}

pub(crate) fn config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    match explicit_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::default_path()
            .ok_or_else(|| Error::Config("no config directory on this platform".to_string())),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
