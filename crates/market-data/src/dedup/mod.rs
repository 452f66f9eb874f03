//! Concurrent request deduplication.
//!
//! Collapses concurrent identical requests into a single upstream
//! computation: the first caller for a key creates a shared in-flight
//! ticket, every later caller joins it, and all of them observe the one
//! settled outcome. The ticket is removed at settlement, so this layer
//! never extends a result's lifetime - that is the cache's job.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::{debug, warn};

struct Ticket<T: Clone> {
    /// Generation id, so settlement only removes its own ticket and never
    /// a successor created for the same key.
    id: u64,
    fut: Shared<BoxFuture<'static, T>>,
}

/// Per-key single-flight table.
///
/// `T` is the shared outcome; pick a cloneable shape that carries failure
/// (`Option<..>`, `Result<_, SharedError>`) when joiners must observe the
/// same failure as the initiating caller.
pub struct Deduplicator<T: Clone> {
    tickets: Mutex<HashMap<String, Ticket<T>>>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> Deduplicator<T> {
    pub fn new() -> Self {
        Self {
            tickets: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Lock the ticket table, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a dangling ticket for a settled
    /// computation, which the generation check cleans up on the next call.
    fn lock_tickets(&self) -> MutexGuard<'_, HashMap<String, Ticket<T>>> {
        self.tickets.lock().unwrap_or_else(|poisoned| {
            warn!("Deduplicator ticket table mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Run `computation` unless an identical request is already in
    /// flight, in which case its result is awaited instead.
    ///
    /// The ticket is published under the table lock before the first
    /// suspension point, so two callers can never both decide to start
    /// the computation. When joining, `computation` is dropped unpolled.
    pub async fn deduplicate<F>(&self, key: String, computation: F) -> T
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (fut, created) = {
            let mut tickets = self.lock_tickets();

            if let Some(ticket) = tickets.get(&key) {
                debug!("Joining in-flight request for '{}'", key);
                (ticket.fut.clone(), None)
            } else {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let fut = computation.boxed().shared();
                tickets.insert(
                    key.clone(),
                    Ticket {
                        id,
                        fut: fut.clone(),
                    },
                );
                (fut, Some(id))
            }
        };

        let result = fut.await;

        // Only the creator retires the ticket, and only if it still owns
        // the slot (a later caller may have created a fresh ticket after a
        // racing settlement).
        if let Some(id) = created {
            let mut tickets = self.lock_tickets();
            if tickets.get(&key).is_some_and(|t| t.id == id) {
                tickets.remove(&key);
            }
        }

        result
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock_tickets().len()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Deduplicator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_computation() {
        let dedup = Arc::new(Deduplicator::<u64>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dedup = Arc::clone(&dedup);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                dedup
                    .deduplicate("quote:AAPL".to_string(), async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        42u64
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_collapse() {
        let dedup = Arc::new(Deduplicator::<u64>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |key: &str| {
            let dedup = Arc::clone(&dedup);
            let calls = Arc::clone(&calls);
            let key = key.to_string();
            async move {
                dedup
                    .deduplicate(key, async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        1u64
                    })
                    .await
            }
        };

        let (a, b) = tokio::join!(run("quote:AAPL"), run("quote:MSFT"));
        assert_eq!(a + b, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_shared_by_all_joined_callers() {
        let dedup = Arc::new(Deduplicator::<Result<u64, String>>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = || {
            let dedup = Arc::clone(&dedup);
            let calls = Arc::clone(&calls);
            async move {
                dedup
                    .deduplicate("quote:BAD".to_string(), async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Err("upstream down".to_string())
                    })
                    .await
            }
        };

        let (a, b, c) = tokio::join!(run(), run(), run());
        assert_eq!(a, Err("upstream down".to_string()));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ticket_removed_after_settlement() {
        let dedup = Deduplicator::<u64>::new();

        dedup.deduplicate("k".to_string(), async { 1 }).await;
        assert_eq!(dedup.in_flight(), 0);

        // A call after settlement starts a fresh computation.
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            dedup
                .deduplicate("k".to_string(), async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    2
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_joiner_computation_is_never_polled() {
        let dedup = Arc::new(Deduplicator::<u64>::new());

        let slow = {
            let dedup = Arc::clone(&dedup);
            async move {
                dedup
                    .deduplicate("k".to_string(), async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        1u64
                    })
                    .await
            }
        };

        let joiner = {
            let dedup = Arc::clone(&dedup);
            async move {
                // Let the first caller publish its ticket.
                tokio::time::sleep(Duration::from_millis(10)).await;
                dedup
                    .deduplicate("k".to_string(), async {
                        panic!("joiner computation must not run");
                    })
                    .await
            }
        };

        let (a, b) = tokio::join!(slow, joiner);
        assert_eq!(a, 1);
        assert_eq!(b, 1);
    }
}
