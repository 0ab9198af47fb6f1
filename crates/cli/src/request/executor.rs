// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request executor: one logical API operation with loading/error/data state.
//!
//! Each call to [`RequestExecutor::execute`] goes through the dedup cache (when
//! enabled) and retries transient failures with exponential backoff. State is
//! published on a `watch` channel.
//!
//! Overlapping `execute` calls with different arguments are not ordered:
//! whichever settles last wins the visible state. Callers that care must not
//! overlap calls.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use fl_core::{is_retryable, BackoffPolicy, ErrorInfo};

use super::dedup::DedupCache;
use super::key::request_key;
use crate::lock;

/// Envelope returned by the injected request function.
///
/// `success: false` is treated as a failed attempt for retry and dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ErrorInfo) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorInfo> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (true, None, _) => Err(ErrorInfo::malformed("successful response carried no data")),
            (false, _, Some(error)) => Err(error),
            (false, _, None) => Err(ErrorInfo::unknown("request failed without an error body")),
        }
    }
}

/// Future returned by a [`RequestFn`].
pub type RequestFuture<T> = BoxFuture<'static, ApiResponse<T>>;

/// The unit of work an executor wraps (usually an HTTP call).
pub type RequestFn<A, T> = Arc<dyn Fn(A) -> RequestFuture<T> + Send + Sync>;

/// Per-executor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Execute once on construction.
    pub immediate: bool,
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub deduplicate: bool,
    /// Explicit dedup key. When absent the key is derived from the arguments.
    pub cache_key: Option<String>,
    /// Prefix for derived keys, normally the endpoint name.
    pub scope: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            immediate: false,
            max_retries: 3,
            retry_delay_ms: 1000,
            deduplicate: true,
            cache_key: None,
            scope: "request".to_string(),
        }
    }
}

impl ExecutorConfig {
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(self.retry_delay_ms), self.max_retries)
    }
}

/// Loading/error/data triple owned by one executor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

impl<T> Default for ExecutionState<T> {
    fn default() -> Self {
        ExecutionState {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Coarse phase derived from an [`ExecutionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Idle,
    Loading,
    Success,
    Failure,
}

impl<T> ExecutionState<T> {
    pub fn phase(&self) -> ExecutionPhase {
        if self.loading {
            ExecutionPhase::Loading
        } else if self.error.is_some() {
            ExecutionPhase::Failure
        } else if self.data.is_some() {
            ExecutionPhase::Success
        } else {
            ExecutionPhase::Idle
        }
    }
}

type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&ErrorInfo) + Send + Sync>;
type CompleteHook = Arc<dyn Fn() + Send + Sync>;

/// Optional hooks run after an execution settles.
pub struct Callbacks<T> {
    on_success: Option<SuccessHook<T>>,
    on_error: Option<ErrorHook>,
    on_complete: Option<CompleteHook>,
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Callbacks {
            on_success: None,
            on_error: None,
            on_complete: None,
        }
    }
}

/// Builder for [`RequestExecutor`].
pub struct ExecutorBuilder<A, T> {
    request: RequestFn<A, T>,
    config: ExecutorConfig,
    cache: Option<DedupCache<T>>,
    callbacks: Callbacks<T>,
    initial_args: Option<A>,
}

impl<A, T> ExecutorBuilder<A, T>
where
    A: Serialize + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares in-flight work with every executor holding the same cache.
    pub fn cache(mut self, cache: DedupCache<T>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Arguments for the immediate execution.
    pub fn args(mut self, args: A) -> Self {
        self.initial_args = Some(args);
        self
    }

    pub fn on_success(mut self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.callbacks.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&ErrorInfo) + Send + Sync + 'static) -> Self {
        self.callbacks.on_error = Some(Arc::new(hook));
        self
    }

    pub fn on_complete(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_complete = Some(Arc::new(hook));
        self
    }

    /// Builds the executor, spawning the first execution when `immediate` is set.
    pub fn build(self) -> RequestExecutor<A, T> {
        let cache = if self.config.deduplicate {
            Some(self.cache.unwrap_or_default())
        } else {
            None
        };
        let (state, _) = watch::channel(ExecutionState::default());
        let executor = RequestExecutor {
            inner: Arc::new(Inner {
                request: self.request,
                config: self.config,
                cache,
                callbacks: self.callbacks,
                state,
                last_args: Mutex::new(None),
                attempts: AtomicU32::new(0),
                token: CancellationToken::new(),
            }),
        };

        if executor.inner.config.immediate {
            match (self.initial_args, tokio::runtime::Handle::try_current()) {
                (Some(args), Ok(handle)) => {
                    let first = executor.clone();
                    handle.spawn(async move {
                        first.execute(args).await;
                    });
                }
                (None, _) => {
                    tracing::warn!("immediate execution requested without arguments, skipping")
                }
                (_, Err(_)) => {
                    tracing::warn!("immediate execution requested outside a runtime, skipping")
                }
            }
        }

        executor
    }
}

impl<A, T> ExecutorBuilder<A, T>
where
    A: Serialize + Clone + Default + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Executes once on build, with `A::default()` unless [`args`](Self::args)
    /// supplied arguments. Call after [`config`](Self::config), which replaces
    /// the whole configuration.
    pub fn immediate(mut self) -> Self {
        self.config.immediate = true;
        if self.initial_args.is_none() {
            self.initial_args = Some(A::default());
        }
        self
    }
}

struct Inner<A, T> {
    request: RequestFn<A, T>,
    config: ExecutorConfig,
    cache: Option<DedupCache<T>>,
    callbacks: Callbacks<T>,
    state: watch::Sender<ExecutionState<T>>,
    last_args: Mutex<Option<A>>,
    attempts: AtomicU32,
    token: CancellationToken,
}

/// Wraps one API operation with state, retry and deduplication.
///
/// Cloning yields another handle to the same executor and state.
pub struct RequestExecutor<A, T> {
    inner: Arc<Inner<A, T>>,
}

impl<A, T> Clone for RequestExecutor<A, T> {
    fn clone(&self) -> Self {
        RequestExecutor {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T> RequestExecutor<A, T>
where
    A: Serialize + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn builder(request: RequestFn<A, T>) -> ExecutorBuilder<A, T> {
        ExecutorBuilder {
            request,
            config: ExecutorConfig::default(),
            cache: None,
            callbacks: Callbacks::default(),
            initial_args: None,
        }
    }

    /// Builder from a plain async closure.
    pub fn from_fn<F, Fut>(request: F) -> ExecutorBuilder<A, T>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResponse<T>> + Send + 'static,
    {
        let request: RequestFn<A, T> =
            Arc::new(move |args: A| -> RequestFuture<T> { Box::pin(request(args)) });
        Self::builder(request)
    }

    /// Current state snapshot.
    pub fn state(&self) -> ExecutionState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionState<T>> {
        self.inner.state.subscribe()
    }

    /// Attempts made by the most recent execution.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    /// Marks the owner as gone. Results that settle afterwards are discarded.
    pub fn teardown(&self) {
        self.inner.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Runs the request, returning the data or `None` on failure.
    ///
    /// Errors are never returned; read them from [`state`](Self::state).
    pub async fn execute(&self, args: A) -> Option<T> {
        if self.is_torn_down() {
            return None;
        }

        *lock(&self.inner.last_args) = Some(args.clone());
        self.write(|state| {
            state.loading = true;
            state.error = None;
        });

        let outcome = self.run_with_retry(args).await;

        if self.is_torn_down() {
            tracing::debug!(scope = %self.inner.config.scope, "owner torn down, discarding result");
            return None;
        }

        let callbacks = &self.inner.callbacks;
        let data = match outcome {
            Ok(data) => {
                self.write(|state| {
                    state.data = Some(data.clone());
                    state.loading = false;
                    state.error = None;
                });
                if let Some(ref hook) = callbacks.on_success {
                    hook(&data);
                }
                Some(data)
            }
            Err(error) => {
                self.write(|state| {
                    state.data = None;
                    state.loading = false;
                    state.error = Some(error.clone());
                });
                if let Some(ref hook) = callbacks.on_error {
                    hook(&error);
                }
                None
            }
        };
        if let Some(ref hook) = callbacks.on_complete {
            hook();
        }
        data
    }

    /// Clears data, error and loading without issuing a request.
    pub fn reset(&self) {
        if self.is_torn_down() {
            return;
        }
        self.write(|state| *state = ExecutionState::default());
    }

    /// Re-runs the most recent arguments. No-op before the first execute.
    pub async fn refresh(&self) -> Option<T> {
        let args = lock(&self.inner.last_args).clone();
        match args {
            Some(args) => self.execute(args).await,
            None => None,
        }
    }

    async fn run_with_retry(&self, args: A) -> Result<T, ErrorInfo> {
        let config = &self.inner.config;
        let policy = config.backoff();
        let key = self.dedup_key(&args);
        let mut attempt = 0u32;

        loop {
            self.inner.attempts.store(attempt + 1, Ordering::Release);
            let error = match self.attempt_once(&args, key.as_deref()).await {
                Ok(data) => return Ok(data),
                Err(error) => error,
            };

            let decision = policy.on_failure(attempt, &error);
            match decision.computed_delay {
                Some(delay) => {
                    tracing::debug!(
                        scope = %config.scope,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying request"
                    );
                    tokio::select! {
                        _ = self.inner.token.cancelled() => return Err(error),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                None if is_retryable(&error) => {
                    tracing::warn!(scope = %config.scope, attempts = attempt + 1, error = %error, "retries exhausted");
                    return Err(ErrorInfo::retries_exhausted(attempt + 1, &error));
                }
                None => return Err(error),
            }
        }
    }

    async fn attempt_once(&self, args: &A, key: Option<&str>) -> Result<T, ErrorInfo> {
        let request = Arc::clone(&self.inner.request);
        let args = args.clone();
        match (&self.inner.cache, key) {
            (Some(cache), Some(key)) => {
                cache
                    .acquire(key, move || async move { request(args).await.into_result() })
                    .await
            }
            _ => request(args).await.into_result(),
        }
    }

    fn dedup_key(&self, args: &A) -> Option<String> {
        let config = &self.inner.config;
        if self.inner.cache.is_none() {
            return None;
        }
        match request_key(config.cache_key.as_deref(), &config.scope, args) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(scope = %config.scope, error = %e, "cannot derive request key, not deduplicating");
                None
            }
        }
    }

    fn write(&self, update: impl FnOnce(&mut ExecutionState<T>)) {
        self.inner.state.send_modify(update);
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
