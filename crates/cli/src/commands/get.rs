// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::Value;

use fl_core::ErrorInfo;

use crate::cli::RetryArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::request::{ExecutorConfig, RequestExecutor, RequestFn};

/// Fetch one API path and print the response body as JSON.
pub async fn run(config: &Config, path: String, retry: RetryArgs) -> Result<()> {
    let client = config.api_client()?;
    let value = fetch(client.get_fn(), config.executor_config(), path, &retry).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Applies the command-line overrides to the configured executor settings.
pub(crate) fn executor_config(mut config: ExecutorConfig, retry: &RetryArgs) -> ExecutorConfig {
    if let Some(retries) = retry.retries {
        config.max_retries = retries;
    }
    if let Some(delay) = retry.retry_delay {
        config.retry_delay_ms = delay;
    }
    if retry.no_dedup {
        config.deduplicate = false;
    }
    config.scope = "get".to_string();
    config
}

pub(crate) async fn fetch(
    request: RequestFn<String, Value>,
    config: ExecutorConfig,
    path: String,
    retry: &RetryArgs,
) -> Result<Value> {
    let executor = RequestExecutor::builder(request)
        .config(executor_config(config, retry))
        .build();

    let data = executor.execute(path.clone()).await;
    tracing::debug!(path = %path, attempts = executor.attempts(), "get finished");

    match data {
        Some(value) => Ok(value),
        None => {
            let error = executor
                .state()
                .error
                .unwrap_or_else(|| ErrorInfo::unknown("request produced no result"));
            Err(Error::from(error))
        }
    }
}

#[cfg(test)]
#[path = "get_tests.rs"]
mod tests;
