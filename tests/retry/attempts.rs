use callguard::retry::{Retry, RetryConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct FetchError(usize);

fn config(max_attempts: usize) -> RetryConfig<FetchError> {
    RetryConfig::builder()
        .max_attempts(max_attempts)
        .fixed_backoff(Duration::from_millis(1))
        .build()
}

/// fail, fail, succeed with three attempts runs the operation three times
#[tokio::test]
async fn succeeds_on_last_attempt() {
    let calls = AtomicUsize::new(0);

    let result = Retry::new()
        .execute(&config(3), || async {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt < 3 {
                Err(FetchError(attempt))
            } else {
                Ok(attempt)
            }
        })
        .await;

    assert_eq!(result, Ok(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// The error of the final attempt is returned as-is
#[tokio::test]
async fn surfaces_last_failure_unchanged() {
    let calls = AtomicUsize::new(0);

    let result: Result<(), _> = Retry::new()
        .execute(&config(3), || async {
            Err(FetchError(calls.fetch_add(1, Ordering::SeqCst) + 1))
        })
        .await;

    assert_eq!(result, Err(FetchError(3)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// A first-attempt success never retries
#[tokio::test]
async fn immediate_success_runs_once() {
    let calls = AtomicUsize::new(0);
    let successes = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&successes);
    let config = RetryConfig::<FetchError>::builder()
        .on_success(move |attempts| recorder.lock().unwrap().push(attempts))
        .build();

    let result = Retry::new()
        .execute(&config, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FetchError>("ok")
        })
        .await;

    assert_eq!(result, Ok("ok"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*successes.lock().unwrap(), vec![1]);
}

/// Zero attempts is treated as a single attempt
#[tokio::test]
async fn zero_attempts_still_runs_once() {
    let calls = AtomicUsize::new(0);

    let result: Result<(), _> = Retry::new()
        .execute(&config(0), || async {
            Err(FetchError(calls.fetch_add(1, Ordering::SeqCst) + 1))
        })
        .await;

    assert_eq!(result, Err(FetchError(1)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// One configuration serves concurrent executions independently
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_config_has_no_cross_call_state() {
    let config = Arc::new(config(3));
    let mut handles = Vec::new();

    for _ in 0..8 {
        let config = Arc::clone(&config);
        handles.push(tokio::spawn(async move {
            let calls = AtomicUsize::new(0);
            let result = Retry::new()
                .execute(&*config, || async {
                    let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt < 2 {
                        Err(FetchError(attempt))
                    } else {
                        Ok(attempt)
                    }
                })
                .await;
            (result, calls.load(Ordering::SeqCst))
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), (Ok(2), 2));
    }
}

/// Exhausted retries report every intermediate attempt
#[tokio::test]
async fn events_describe_each_attempt() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (retries, errors) = (Arc::clone(&log), Arc::clone(&log));
    let config = RetryConfig::<FetchError>::builder()
        .max_attempts(4)
        .fixed_backoff(Duration::from_millis(1))
        .name("catalog#sync")
        .on_retry(move |attempt, delay| {
            retries
                .lock()
                .unwrap()
                .push(format!("retry {attempt} after {}ms", delay.as_millis()))
        })
        .on_error(move |attempts| errors.lock().unwrap().push(format!("gave up after {attempts}")))
        .build();

    let _: Result<(), _> = Retry::new()
        .execute(&config, || async { Err(FetchError(0)) })
        .await;

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "retry 1 after 1ms",
            "retry 2 after 1ms",
            "retry 3 after 1ms",
            "gave up after 4",
        ]
    );
}
