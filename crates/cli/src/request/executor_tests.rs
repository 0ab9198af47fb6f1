// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the request executor.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use fl_core::codes;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Stats {
    value: u32,
}

/// Request function that replays scripted responses and counts calls.
///
/// The last response repeats once the script runs out.
#[derive(Clone)]
struct Scripted {
    calls: Arc<AtomicU32>,
    responses: Arc<Mutex<VecDeque<ApiResponse<Stats>>>>,
    latency: Duration,
}

impl Scripted {
    fn new(responses: Vec<ApiResponse<Stats>>) -> Self {
        Scripted {
            calls: Arc::new(AtomicU32::new(0)),
            responses: Arc::new(Mutex::new(responses.into())),
            latency: Duration::from_millis(10),
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn request_fn<A: Send + 'static>(&self) -> RequestFn<A, Stats> {
        let this = self.clone();
        Arc::new(move |_args: A| -> RequestFuture<Stats> {
            this.calls.fetch_add(1, Ordering::SeqCst);
            let response = {
                let mut responses = this.responses.lock().unwrap();
                if responses.len() > 1 {
                    responses.pop_front().unwrap()
                } else {
                    responses.front().cloned().unwrap()
                }
            };
            let latency = this.latency;
            Box::pin(async move {
                tokio::time::sleep(latency).await;
                response
            })
        })
    }
}

fn ok(value: u32) -> ApiResponse<Stats> {
    ApiResponse::ok(Stats { value })
}

fn transient() -> ApiResponse<Stats> {
    ApiResponse::err(ErrorInfo::from_status(503, "unavailable"))
}

fn terminal() -> ApiResponse<Stats> {
    ApiResponse::err(ErrorInfo::from_status(422, "bad filter"))
}

fn quick_config() -> ExecutorConfig {
    ExecutorConfig::default().with_retries(3, 100)
}

#[tokio::test(start_paused = true)]
async fn success_sets_data_and_clears_loading() {
    let script = Scripted::new(vec![ok(42)]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(quick_config())
        .build();

    assert_eq!(executor.state().phase(), ExecutionPhase::Idle);

    let data = executor.execute(1).await;

    assert_eq!(data, Some(Stats { value: 42 }));
    let state = executor.state();
    assert_eq!(state.data, Some(Stats { value: 42 }));
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(state.phase(), ExecutionPhase::Success);
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn loading_is_visible_while_in_flight() {
    let script = Scripted::new(vec![ok(1)]).with_latency(Duration::from_millis(50));
    let executor = RequestExecutor::builder(script.request_fn::<u32>()).build();
    let mut rx = executor.subscribe();

    let running = tokio::spawn({
        let executor = executor.clone();
        async move { executor.execute(1).await }
    });

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().phase(), ExecutionPhase::Loading);

    running.await.unwrap();
    assert_eq!(executor.state().phase(), ExecutionPhase::Success);
}

#[tokio::test(start_paused = true)]
async fn persistent_transient_error_exhausts_after_max_retries_plus_one() {
    let script = Scripted::new(vec![transient()]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(ExecutorConfig::default().with_retries(2, 100))
        .build();

    let data = executor.execute(1).await;

    assert!(data.is_none());
    assert_eq!(script.calls(), 3);
    assert_eq!(executor.attempts(), 3);
    let state = executor.state();
    assert!(state.data.is_none());
    let error = state.error.unwrap();
    assert_eq!(error.code, codes::RETRIES_EXHAUSTED);
    assert!(error.is_exhausted());
}

#[tokio::test(start_paused = true)]
async fn retries_wait_exponential_backoff() {
    let script = Scripted::new(vec![transient()]).with_latency(Duration::ZERO);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(ExecutorConfig::default().with_retries(2, 100))
        .build();

    let started = Instant::now();
    executor.execute(1).await;

    // 100ms before the second attempt, 200ms before the third
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn terminal_error_is_never_retried() {
    let script = Scripted::new(vec![terminal()]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(quick_config())
        .build();

    executor.execute(1).await;

    assert_eq!(script.calls(), 1);
    assert_eq!(executor.attempts(), 1);
    let error = executor.state().error.unwrap();
    assert_eq!(error.code, codes::VALIDATION_ERROR);
    assert_eq!(executor.state().phase(), ExecutionPhase::Failure);
}

#[tokio::test(start_paused = true)]
async fn transient_then_success_recovers() {
    let script = Scripted::new(vec![transient(), transient(), ok(9)]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(quick_config())
        .build();

    let data = executor.execute(1).await;

    assert_eq!(data, Some(Stats { value: 9 }));
    assert_eq!(script.calls(), 3);
    assert!(executor.state().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_response_without_body_is_unknown() {
    let script = Scripted::new(vec![ApiResponse {
        success: false,
        data: None,
        error: None,
    }]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>()).build();

    executor.execute(1).await;

    assert_eq!(executor.state().error.unwrap().code, codes::UNKNOWN_ERROR);
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn two_executors_with_same_cache_key_share_one_call() {
    let script = Scripted::new(vec![ok(42)]).with_latency(Duration::from_millis(50));
    let cache = DedupCache::new();
    let config = ExecutorConfig::default().with_cache_key("dashboard-stats");

    let first = RequestExecutor::builder(script.request_fn::<()>())
        .config(config.clone())
        .cache(cache.clone())
        .build();
    let second = RequestExecutor::builder(script.request_fn::<()>())
        .config(config)
        .cache(cache.clone())
        .build();

    let (a, b) = tokio::join!(first.execute(()), second.execute(()));

    assert_eq!(script.calls(), 1);
    assert_eq!(a, Some(Stats { value: 42 }));
    assert_eq!(b, Some(Stats { value: 42 }));
    assert_eq!(first.state().data, Some(Stats { value: 42 }));
    assert_eq!(second.state().data, Some(Stats { value: 42 }));
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn same_cache_key_in_other_scope_runs_separately() {
    let script = Scripted::new(vec![ok(42)]).with_latency(Duration::from_millis(50));
    let cache = DedupCache::new();
    let config = ExecutorConfig::default().with_cache_key("dashboard-stats");

    let alerts = RequestExecutor::builder(script.request_fn::<()>())
        .config(config.clone().with_scope("alerts"))
        .cache(cache.clone())
        .build();
    let clients = RequestExecutor::builder(script.request_fn::<()>())
        .config(config.with_scope("clients"))
        .cache(cache.clone())
        .build();

    let (a, b) = tokio::join!(alerts.execute(()), clients.execute(()));

    assert_eq!(script.calls(), 2);
    assert_eq!(a, Some(Stats { value: 42 }));
    assert_eq!(b, Some(Stats { value: 42 }));
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_identical_calls_observe_same_failure() {
    let script = Scripted::new(vec![terminal()]).with_latency(Duration::from_millis(50));
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(ExecutorConfig::default().with_scope("alerts"))
        .build();

    let (a, b, c) = tokio::join!(executor.execute(7), executor.execute(7), executor.execute(7));

    assert_eq!((a, b, c), (None, None, None));
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn dedup_disabled_issues_every_call() {
    let script = Scripted::new(vec![ok(1)]).with_latency(Duration::from_millis(50));
    let config = ExecutorConfig {
        deduplicate: false,
        ..ExecutorConfig::default()
    };
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(config)
        .build();

    tokio::join!(executor.execute(7), executor.execute(7));

    assert_eq!(script.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn callbacks_fire_on_settle() {
    let succeeded = Arc::new(AtomicU32::new(0));
    let failed = Arc::new(AtomicU32::new(0));
    let completed = Arc::new(AtomicU32::new(0));

    let script = Scripted::new(vec![ok(5), terminal()]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .on_success({
            let succeeded = Arc::clone(&succeeded);
            move |stats: &Stats| {
                succeeded.fetch_add(stats.value, Ordering::SeqCst);
            }
        })
        .on_error({
            let failed = Arc::clone(&failed);
            move |_| {
                failed.fetch_add(1, Ordering::SeqCst);
            }
        })
        .on_complete({
            let completed = Arc::clone(&completed);
            move || {
                completed.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build();

    executor.execute(1).await;
    executor.execute(2).await;

    assert_eq!(succeeded.load(Ordering::SeqCst), 5);
    assert_eq!(failed.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_returns_to_idle_without_request() {
    let script = Scripted::new(vec![ok(3)]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>()).build();

    executor.execute(1).await;
    executor.reset();

    assert_eq!(executor.state(), ExecutionState::default());
    assert_eq!(executor.state().phase(), ExecutionPhase::Idle);
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_is_noop_before_first_execute() {
    let script = Scripted::new(vec![ok(3)]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>()).build();

    assert!(executor.refresh().await.is_none());
    assert_eq!(script.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_reuses_last_arguments() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let executor = RequestExecutor::from_fn({
        let seen = Arc::clone(&seen);
        move |page: u32| {
            seen.lock().unwrap().push(page);
            async move { ApiResponse::ok(Stats { value: page }) }
        }
    })
    .build();

    executor.execute(4).await;
    let data = executor.refresh().await;

    assert_eq!(data, Some(Stats { value: 4 }));
    assert_eq!(*seen.lock().unwrap(), vec![4, 4]);
}

#[tokio::test(start_paused = true)]
async fn teardown_discards_late_result() {
    let script = Scripted::new(vec![ok(8)]).with_latency(Duration::from_millis(50));
    let completed = Arc::new(AtomicBool::new(false));
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .on_complete({
            let completed = Arc::clone(&completed);
            move || completed.store(true, Ordering::SeqCst)
        })
        .build();

    let running = tokio::spawn({
        let executor = executor.clone();
        async move { executor.execute(1).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    executor.teardown();

    assert!(running.await.unwrap().is_none());
    assert_eq!(script.calls(), 1);
    // State is frozen at the last write before teardown
    let state = executor.state();
    assert!(state.loading);
    assert!(state.data.is_none());
    assert!(!completed.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_pending_retries() {
    let script = Scripted::new(vec![transient()]).with_latency(Duration::ZERO);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .config(ExecutorConfig::default().with_retries(5, 1000))
        .build();

    let running = tokio::spawn({
        let executor = executor.clone();
        async move { executor.execute(1).await }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;
    executor.teardown();
    running.await.unwrap();

    assert_eq!(script.calls(), 1);
    assert!(executor.execute(1).await.is_none());
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn immediate_mode_executes_on_build() {
    let script = Scripted::new(vec![ok(11)]);
    let config = ExecutorConfig {
        immediate: true,
        ..ExecutorConfig::default()
    };
    let executor = RequestExecutor::builder(script.request_fn::<()>())
        .config(config)
        .args(())
        .build();

    let mut rx = executor.subscribe();
    rx.wait_for(|state| state.phase() == ExecutionPhase::Success)
        .await
        .unwrap();

    assert_eq!(script.calls(), 1);
    assert_eq!(executor.state().data, Some(Stats { value: 11 }));
}

#[tokio::test(start_paused = true)]
async fn immediate_without_args_uses_default_arguments() {
    let script = Scripted::new(vec![ok(12)]);
    let executor = RequestExecutor::builder(script.request_fn::<()>())
        .config(ExecutorConfig::default().with_scope("stats"))
        .immediate()
        .build();

    let mut rx = executor.subscribe();
    rx.wait_for(|state| state.phase() == ExecutionPhase::Success)
        .await
        .unwrap();

    assert_eq!(script.calls(), 1);
    assert_eq!(executor.state().data, Some(Stats { value: 12 }));
}

#[tokio::test(start_paused = true)]
async fn immediate_keeps_explicit_args() {
    let script = Scripted::new(vec![ok(13)]);
    let executor = RequestExecutor::builder(script.request_fn::<u32>())
        .args(7)
        .immediate()
        .build();

    let mut rx = executor.subscribe();
    rx.wait_for(|state| state.phase() == ExecutionPhase::Success)
        .await
        .unwrap();

    assert_eq!(script.calls(), 1);
    assert_eq!(*lock(&executor.inner.last_args), Some(7));
}

#[test]
fn api_response_into_result() {
    assert_eq!(ok(1).into_result().unwrap(), Stats { value: 1 });

    let missing: ApiResponse<Stats> = ApiResponse {
        success: true,
        data: None,
        error: None,
    };
    assert_eq!(
        missing.into_result().unwrap_err().code,
        codes::MALFORMED_RESPONSE
    );
    assert_eq!(
        terminal().into_result().unwrap_err().code,
        codes::VALIDATION_ERROR
    );
}

#[test]
fn api_response_parses_wire_envelope() {
    let parsed: ApiResponse<Stats> =
        serde_json::from_str(r#"{"success":true,"data":{"value":42}}"#).unwrap();
    assert_eq!(parsed, ok(42));

    let parsed: ApiResponse<Stats> = serde_json::from_str(
        r#"{"success":false,"error":{"code":"AUTH_ERROR","message":"expired"}}"#,
    )
    .unwrap();
    assert_eq!(parsed.error.unwrap().code, codes::AUTH_ERROR);
}
