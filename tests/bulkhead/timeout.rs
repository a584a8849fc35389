use super::CallError;
use callguard::PolicyKey;
use callguard::bulkhead::{Bulkhead, BulkheadConfig, BulkheadEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Holds the only permit of `key` until the returned sender fires or drops.
async fn occupy(
    bulkhead: &Bulkhead,
    key: &PolicyKey,
    config: &BulkheadConfig,
) -> (oneshot::Sender<()>, tokio::task::JoinHandle<Result<(), CallError>>) {
    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let bulkhead = bulkhead.clone();
    let key = key.clone();
    let config = config.clone();
    let handle = tokio::spawn(async move {
        bulkhead
            .execute(&key, &config, || async move {
                let _ = entered_tx.send(());
                let _ = release_rx.await;
                Ok(())
            })
            .await
    });
    entered_rx.await.unwrap();
    (release_tx, handle)
}

/// A waiter gets a permit that frees up within its wait timeout
#[tokio::test(start_paused = true)]
async fn waiter_acquires_permit_released_in_time() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::from_millis(200))
        .build();
    let key = PolicyKey::from("billing#charge");

    let (release, holder) = occupy(&bulkhead, &key, &config).await;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = release.send(());
    });

    let start = Instant::now();
    let result: Result<&str, CallError> = bulkhead
        .execute(&key, &config, || async { Ok("charged") })
        .await;

    assert_eq!(result.ok(), Some("charged"));
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_millis(200));
    assert!(holder.await.unwrap().is_ok());
}

/// A rejected waiter has waited the full wait timeout
#[tokio::test(start_paused = true)]
async fn rejection_happens_after_wait_timeout() {
    let rejected = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&rejected);
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::from_millis(300))
        .on_call_rejected(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();
    let key = PolicyKey::from("billing#refund");

    let (release, holder) = occupy(&bulkhead, &key, &config).await;

    let start = Instant::now();
    let result: Result<(), CallError> = bulkhead.execute(&key, &config, || async { Ok(()) }).await;

    assert!(result.unwrap_err().is_resource_exhausted());
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(rejected.load(Ordering::SeqCst), 1);

    drop(release);
    assert!(holder.await.unwrap().is_ok());
}

/// Zero wait timeout still takes a free permit
#[tokio::test]
async fn zero_wait_timeout_uses_free_permit() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::ZERO)
        .build();
    let key = PolicyKey::from("billing#quote");

    let result: Result<u32, CallError> = bulkhead.execute(&key, &config, || async { Ok(3) }).await;
    assert_eq!(result.ok(), Some(3));
}

/// Zero capacity rejects every call
#[tokio::test(start_paused = true)]
async fn zero_capacity_rejects_everything() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(0)
        .wait_timeout(Duration::from_millis(10))
        .build();
    let key = PolicyKey::from("billing#disabled");

    let result: Result<(), CallError> = bulkhead.execute(&key, &config, || async { Ok(()) }).await;
    assert!(result.unwrap_err().is_resource_exhausted());
    assert_eq!(bulkhead.available_permits(&key), Some(0));
}

/// Cancelling a waiter ends its wait immediately
#[tokio::test(start_paused = true)]
async fn cancellation_during_wait_returns_cancelled() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&events);
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::from_secs(60))
        .on_event(move |event: &BulkheadEvent| {
            let label = match event {
                BulkheadEvent::CallPermitted { .. } => "permitted",
                BulkheadEvent::CallRejected { .. } => "rejected",
                BulkheadEvent::CallFinished { .. } => "finished",
                BulkheadEvent::CallFailed { .. } => "failed",
                BulkheadEvent::CallCancelled { .. } => "cancelled",
            };
            recorder.lock().unwrap().push(label);
        })
        .build();
    let key = PolicyKey::from("billing#settle");

    let (release, holder) = occupy(&bulkhead, &key, &config).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let invoked = AtomicUsize::new(0);
    let result: Result<(), CallError> = bulkhead
        .execute_cancellable(&key, &config, &cancel, || async {
            invoked.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

    assert!(result.unwrap_err().is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);

    drop(release);
    assert!(holder.await.unwrap().is_ok());
    assert_eq!(bulkhead.available_permits(&key), Some(1));
    assert_eq!(
        *events.lock().unwrap(),
        vec!["permitted", "cancelled", "finished"]
    );
}

/// An already cancelled token is reported even when a permit is free
#[tokio::test]
async fn already_cancelled_token_wins_over_free_permit() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::default();
    let key = PolicyKey::from("billing#precancelled");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result: Result<(), CallError> = bulkhead
        .execute_cancellable(&key, &config, &cancel, || async { Ok(()) })
        .await;

    assert!(result.unwrap_err().is_cancelled());
}
