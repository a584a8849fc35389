use super::CallError;
use callguard::PolicyKey;
use callguard::bulkhead::{Bulkhead, BulkheadConfig};
use std::time::Duration;
use tokio::sync::oneshot;

/// Test permit released when the operation fails
#[tokio::test]
async fn permit_released_on_operation_error() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder().max_concurrent_calls(1).build();
    let key = PolicyKey::from("ledger#post");

    for _ in 0..5 {
        let result: Result<(), CallError> = bulkhead
            .execute(&key, &config, || async {
                Err(CallError::Operation("constraint violated".to_string()))
            })
            .await;
        assert!(result.unwrap_err().is_operation());
        assert_eq!(bulkhead.available_permits(&key), Some(1));
    }
}

/// Test permit released even if the caller's future is dropped
#[tokio::test(start_paused = true)]
async fn permit_released_on_future_drop() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::from_millis(100))
        .build();
    let key = PolicyKey::from("ledger#slow");

    let slow = bulkhead.execute(&key, &config, || async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<_, CallError>(())
    });
    assert!(
        tokio::time::timeout(Duration::from_millis(10), slow)
            .await
            .is_err()
    );

    assert_eq!(bulkhead.available_permits(&key), Some(1));
    let result: Result<(), CallError> = bulkhead.execute(&key, &config, || async { Ok(()) }).await;
    assert!(result.is_ok());
}

/// Test permit released on panic in the operation
#[tokio::test]
async fn permit_released_on_panic() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::from_millis(100))
        .build();
    let key = PolicyKey::from("ledger#panics");

    let task = {
        let bulkhead = bulkhead.clone();
        let config = config.clone();
        let key = key.clone();
        tokio::spawn(async move {
            bulkhead
                .execute(&key, &config, || async {
                    if key.as_str().ends_with("panics") {
                        panic!("operation panic");
                    }
                    Ok::<_, CallError>(())
                })
                .await
        })
    };
    assert!(task.await.unwrap_err().is_panic());

    assert_eq!(bulkhead.available_permits(&key), Some(1));
}

/// A bound handle and keyed calls share one set of permits
#[tokio::test(start_paused = true)]
async fn bound_handle_shares_permits_with_keyed_calls() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(1)
        .wait_timeout(Duration::from_millis(10))
        .build();
    let bound = bulkhead.bind("mail#send", config.clone());
    let key = bound.key().clone();

    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let holder = {
        let bound = bound.clone();
        tokio::spawn(async move {
            bound
                .execute(|| async move {
                    let _ = entered_tx.send(());
                    let _ = release_rx.await;
                    Ok::<_, CallError>(())
                })
                .await
        })
    };
    entered_rx.await.unwrap();
    assert_eq!(bound.available_permits(), 0);
    assert_eq!(bulkhead.available_permits(&key), Some(0));

    let keyed: Result<(), CallError> = bulkhead.execute(&key, &config, || async { Ok(()) }).await;
    assert!(keyed.unwrap_err().is_resource_exhausted());

    release_tx.send(()).unwrap();
    assert!(holder.await.unwrap().is_ok());
    assert_eq!(bound.available_permits(), 1);
}

/// Capacity is fixed by the first configuration a key is used with
#[tokio::test]
async fn first_configuration_fixes_capacity() {
    let bulkhead = Bulkhead::new();
    let key = PolicyKey::from("cache#warm");
    let narrow = BulkheadConfig::builder().max_concurrent_calls(1).build();
    let wide = BulkheadConfig::builder().max_concurrent_calls(50).build();

    let _: Result<(), CallError> = bulkhead.execute(&key, &narrow, || async { Ok(()) }).await;
    let _: Result<(), CallError> = bulkhead.execute(&key, &wide, || async { Ok(()) }).await;

    assert_eq!(bulkhead.max_permits(&key), Some(1));
    assert_eq!(bulkhead.available_permits(&key), Some(1));
}

/// Unused keys have no state
#[test]
fn unused_key_reports_nothing() {
    let bulkhead = Bulkhead::new();
    let key = PolicyKey::from("never#called");

    assert_eq!(bulkhead.available_permits(&key), None);
    assert_eq!(bulkhead.max_permits(&key), None);
    assert!(bulkhead.keys().is_empty());
}

/// Capacities beyond what a semaphore can hold are clamped, not rejected
#[tokio::test]
async fn oversized_capacity_is_clamped() {
    let bulkhead = Bulkhead::new();
    let config = BulkheadConfig::builder()
        .max_concurrent_calls(usize::MAX)
        .build();
    let key = PolicyKey::from("ledger#unbounded");

    assert_eq!(config.max_concurrent_calls(), tokio::sync::Semaphore::MAX_PERMITS);

    let result: Result<u32, CallError> = bulkhead.execute(&key, &config, || async { Ok(7) }).await;
    assert_eq!(result, Ok(7));
    assert_eq!(
        bulkhead.max_permits(&key),
        Some(tokio::sync::Semaphore::MAX_PERMITS)
    );
    assert_eq!(
        bulkhead.available_permits(&key),
        Some(tokio::sync::Semaphore::MAX_PERMITS)
    );
}
