use super::{CallError, failure, init_tracing};
use callguard::PolicyKey;
use callguard::bulkhead::{Bulkhead, BulkheadConfig};
use callguard::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use callguard::fallback::Fallback;
use callguard::retry::{Retry, RetryConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn retry_config(max_attempts: usize) -> RetryConfig<CallError> {
    RetryConfig::builder()
        .max_attempts(max_attempts)
        .fixed_backoff(Duration::from_millis(1))
        .build()
}

/// Retry outside the breaker: once the circuit opens the remaining attempts
/// fail fast and the last error is CircuitOpen
#[tokio::test]
async fn retry_outside_breaker_ends_in_circuit_open() {
    init_tracing();
    let breaker = CircuitBreaker::new();
    let breaker_config = CircuitBreakerConfig::builder()
        .failure_threshold(2)
        .open_timeout(Duration::from_secs(60))
        .build();
    let key = PolicyKey::from("ledger#post");
    let calls = AtomicUsize::new(0);

    let result: Result<(), CallError> = Retry::new()
        .execute(&retry_config(5), || {
            breaker.execute(&key, &breaker_config, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure("ledger unavailable"))
            })
        })
        .await;

    assert_eq!(result, Err(CallError::CircuitOpen { key: key.clone() }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(breaker.state(&key), Some(CircuitState::Open));
}

/// Breaker outside retry: the breaker records one outcome per retried call
#[tokio::test]
async fn breaker_outside_retry_counts_one_failure_per_call() {
    init_tracing();
    let breaker = CircuitBreaker::new();
    let breaker_config = CircuitBreakerConfig::builder().failure_threshold(2).build();
    let key = PolicyKey::from("ledger#close");
    let retry = retry_config(3);
    let calls = AtomicUsize::new(0);

    let result: Result<(), CallError> = breaker
        .execute(&key, &breaker_config, || {
            Retry.execute(&retry, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure("ledger unavailable"))
            })
        })
        .await;

    assert!(result.unwrap_err().is_operation());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let metrics = breaker.metrics(&key).unwrap();
    assert_eq!(metrics.state, CircuitState::Closed);
    assert_eq!(metrics.failure_count, 1);
}

/// A transient failure inside the full stack is absorbed by retry
#[tokio::test]
async fn full_stack_recovers_from_transient_failure() {
    init_tracing();
    let key = PolicyKey::from("ledger#balance");
    let bulkhead = Bulkhead::new();
    let breaker = CircuitBreaker::new();
    let bulkhead_config = BulkheadConfig::builder().max_concurrent_calls(2).build();
    let breaker_config = CircuitBreakerConfig::builder().failure_threshold(5).build();
    let retry = retry_config(3);
    let calls = AtomicUsize::new(0);

    let result = Fallback::<CallError>::new()
        .execute(
            || {
                Retry.execute(&retry, || {
                    breaker.execute(&key, &breaker_config, || {
                        bulkhead.execute(&key, &bulkhead_config, || async {
                            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                                Err(failure("connection reset"))
                            } else {
                                Ok(250_u64)
                            }
                        })
                    })
                })
            },
            || async { Ok(0) },
        )
        .await;

    assert_eq!(result, Ok(250));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(bulkhead.available_permits(&key), Some(2));
    assert_eq!(breaker.metrics(&key).map(|m| m.failure_count), Some(0));
}

/// Fallback outermost catches policy failures from every layer
#[tokio::test]
async fn fallback_catches_open_circuit() {
    init_tracing();
    let key = PolicyKey::from("ledger#audit");
    let breaker = CircuitBreaker::new();
    let breaker_config = CircuitBreakerConfig::builder().failure_threshold(1).build();
    let retry = retry_config(2);

    let _: Result<(), CallError> = breaker
        .execute(&key, &breaker_config, || async { Err(failure("down")) })
        .await;
    assert!(breaker.is_open(&key));

    let seen = Arc::new(std::sync::Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let result = Fallback::<CallError>::new()
        .execute_with_error(
            || {
                Retry.execute(&retry, || {
                    breaker.execute(&key, &breaker_config, || async { Ok("live") })
                })
            },
            |error| async move {
                *recorder.lock().unwrap() = Some(error.is_circuit_open());
                Ok("stale")
            },
        )
        .await;

    assert_eq!(result, Ok("stale"));
    assert_eq!(*seen.lock().unwrap(), Some(true));
}

/// Bulkhead innermost holds a permit only while the operation runs
#[tokio::test(start_paused = true)]
async fn inner_bulkhead_is_free_during_backoff() {
    init_tracing();
    let key = PolicyKey::from("ledger#export");
    let bulkhead = Bulkhead::new();
    let bulkhead_config = BulkheadConfig::builder().max_concurrent_calls(1).build();
    let retry = RetryConfig::<CallError>::builder()
        .max_attempts(2)
        .fixed_backoff(Duration::from_secs(10))
        .build();

    let first = {
        let bulkhead = bulkhead.clone();
        let key = key.clone();
        let bulkhead_config = bulkhead_config.clone();
        tokio::spawn(async move {
            Retry::new()
                .execute(&retry, || {
                    bulkhead.execute(&key, &bulkhead_config, || async {
                        Err::<(), _>(failure("export failed"))
                    })
                })
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(bulkhead.available_permits(&key), Some(1));
    let other: Result<&str, CallError> = bulkhead
        .execute(&key, &bulkhead_config, || async { Ok("other call") })
        .await;
    assert_eq!(other, Ok("other call"));

    assert!(first.await.unwrap().unwrap_err().is_operation());
}

/// Bulkhead outside retry keeps one permit across every attempt
#[tokio::test(start_paused = true)]
async fn outer_bulkhead_holds_permit_across_attempts() {
    init_tracing();
    let key = PolicyKey::from("ledger#import");
    let bulkhead = Bulkhead::new();
    let bulkhead_config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::ZERO)
        .build();
    let retry = RetryConfig::<CallError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_secs(10))
        .build();

    let first = {
        let bulkhead = bulkhead.clone();
        let key = key.clone();
        let bulkhead_config = bulkhead_config.clone();
        tokio::spawn(async move {
            bulkhead
                .execute(&key, &bulkhead_config, || {
                    Retry.execute(&retry, || async { Err::<(), _>(failure("import failed")) })
                })
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(bulkhead.available_permits(&key), Some(0));
    let other: Result<(), CallError> = bulkhead
        .execute(&key, &bulkhead_config, || async { Ok(()) })
        .await;
    assert!(other.unwrap_err().is_resource_exhausted());

    assert!(first.await.unwrap().unwrap_err().is_operation());
    assert_eq!(bulkhead.available_permits(&key), Some(1));
}
