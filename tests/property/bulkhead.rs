//! Property tests for the bulkhead policy.
//!
//! Invariants tested:
//! - Concurrent calls never exceed max_concurrent_calls
//! - Every permit is returned once calls finish, whatever their outcome

use super::CallError;
use callguard::PolicyKey;
use callguard::bulkhead::{Bulkhead, BulkheadConfig};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: The bulkhead never admits more concurrent calls than configured
    #[test]
    fn bulkhead_respects_max_concurrent(
        max_concurrent in 1usize..=20,
        num_requests in 1usize..=100,
        work_duration_ms in 1u64..=10,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let bulkhead = Bulkhead::new();
            let config = BulkheadConfig::builder()
                .max_concurrent_calls(max_concurrent)
                .wait_timeout(Duration::from_secs(10))
                .build();
            let key = PolicyKey::from("property#concurrency");
            let current = Arc::new(AtomicUsize::new(0));
            let max_seen = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::new();
            for _ in 0..num_requests {
                let bulkhead = bulkhead.clone();
                let config = config.clone();
                let key = key.clone();
                let current = Arc::clone(&current);
                let max_seen = Arc::clone(&max_seen);
                handles.push(tokio::spawn(async move {
                    let _: Result<(), CallError> = bulkhead
                        .execute(&key, &config, || async move {
                            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(work_duration_ms)).await;
                            current.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .await;
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            let observed_max = max_seen.load(Ordering::SeqCst);
            prop_assert!(
                observed_max <= max_concurrent,
                "Observed {} concurrent calls but limit was {}",
                observed_max,
                max_concurrent
            );

            Ok(())
        })?;
    }

    /// Property: After any mix of successes and failures all permits are free
    #[test]
    fn bulkhead_returns_every_permit(
        max_concurrent in 1usize..=8,
        outcomes in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let bulkhead = Bulkhead::new();
            let config = BulkheadConfig::builder()
                .max_concurrent_calls(max_concurrent)
                .wait_timeout(Duration::from_secs(10))
                .build();
            let key = PolicyKey::from("property#permits");

            let mut handles = Vec::new();
            for succeed in outcomes {
                let bulkhead = bulkhead.clone();
                let config = config.clone();
                let key = key.clone();
                handles.push(tokio::spawn(async move {
                    let _: Result<(), CallError> = bulkhead
                        .execute(&key, &config, || async move {
                            tokio::task::yield_now().await;
                            if succeed {
                                Ok(())
                            } else {
                                Err(CallError::Operation("failed".to_string()))
                            }
                        })
                        .await;
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            prop_assert_eq!(bulkhead.available_permits(&key), Some(max_concurrent));
            Ok(())
        })?;
    }
}
