use callguard::ResilienceError;
use callguard::retry::{ExponentialBackoff, FnInterval, Retry, RetryConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type CallError = ResilienceError<&'static str>;

/// Three attempts with a 500 ms backoff take at least a second
#[tokio::test(start_paused = true)]
async fn fixed_backoff_waits_between_attempts() {
    let config = RetryConfig::<CallError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(500))
        .build();
    let start = Instant::now();

    let result: Result<(), _> = Retry::new()
        .execute(&config, || async { Err(CallError::Operation("unavailable")) })
        .await;

    assert!(result.unwrap_err().is_operation());
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

/// The same holds on the real clock
#[tokio::test]
async fn fixed_backoff_waits_on_wall_clock() {
    let config = RetryConfig::<CallError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(500))
        .build();
    let start = std::time::Instant::now();

    let _: Result<(), _> = Retry::new()
        .execute(&config, || async { Err(CallError::Operation("unavailable")) })
        .await;

    assert!(start.elapsed() >= Duration::from_millis(1000));
}

/// Default backoff is a fixed second
#[tokio::test(start_paused = true)]
async fn default_backoff_is_one_second() {
    let config = RetryConfig::<CallError>::default();
    let start = Instant::now();

    let _: Result<(), _> = Retry::new()
        .execute(&config, || async { Err(CallError::Operation("unavailable")) })
        .await;

    assert_eq!(config.max_attempts(), 3);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));
}

/// Exponential delays double between attempts
#[tokio::test(start_paused = true)]
async fn exponential_delays_grow() {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&delays);
    let config = RetryConfig::<CallError>::builder()
        .max_attempts(5)
        .backoff(
            ExponentialBackoff::new(Duration::from_millis(100))
                .max_interval(Duration::from_millis(500)),
        )
        .on_retry(move |_, delay| recorder.lock().unwrap().push(delay))
        .build();

    let _: Result<(), _> = Retry::new()
        .execute(&config, || async { Err(CallError::Operation("unavailable")) })
        .await;

    assert_eq!(
        *delays.lock().unwrap(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(500),
        ]
    );
}

/// Custom interval functions receive the zero-based retry index
#[tokio::test(start_paused = true)]
async fn custom_interval_function() {
    let config = RetryConfig::<CallError>::builder()
        .max_attempts(3)
        .backoff(FnInterval::new(|retry| Duration::from_millis(10 * (retry as u64 + 1))))
        .build();
    let start = Instant::now();

    let _: Result<(), _> = Retry::new()
        .execute(&config, || async { Err(CallError::Operation("unavailable")) })
        .await;

    assert!(start.elapsed() >= Duration::from_millis(30));
    assert!(start.elapsed() < Duration::from_millis(40));
}

/// Cancelling during a backoff wait stops retrying and reports Cancelled
#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_backoff() {
    let cancelled_after = Arc::new(AtomicUsize::new(0));
    let recorder = Arc::clone(&cancelled_after);
    let config = RetryConfig::<CallError>::builder()
        .max_attempts(10)
        .fixed_backoff(Duration::from_secs(30))
        .on_cancelled(move |attempts| recorder.store(attempts, Ordering::SeqCst))
        .build();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(45)).await;
        trigger.cancel();
    });

    let calls = AtomicUsize::new(0);
    let start = Instant::now();
    let result: Result<(), _> = Retry::new()
        .execute_cancellable(&config, &cancel, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CallError::Operation("unavailable"))
        })
        .await;

    assert_eq!(result, Err(CallError::Cancelled { layer: "retry" }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cancelled_after.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() >= Duration::from_secs(45));
    assert!(start.elapsed() < Duration::from_secs(60));
}

/// Cancellation does not interrupt an attempt that is already running
#[tokio::test(start_paused = true)]
async fn cancellation_waits_for_running_attempt() {
    let config = RetryConfig::<CallError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(10))
        .build();
    let cancel = CancellationToken::new();

    let result = Retry::new()
        .execute_cancellable(&config, &cancel, || async {
            cancel.cancel();
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, CallError>("finished")
        })
        .await;

    assert_eq!(result, Ok("finished"));
}
