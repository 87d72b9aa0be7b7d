use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes outbound catalog calls: at most one in flight system-wide, with
/// a fixed minimum spacing between call starts (default 6s, i.e. at most 10
/// calls per minute). Callers queue in arrival order and are never dropped.
///
/// Workers must share one instance; a limiter per worker would multiply the
/// aggregate call rate against the external API.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    min_interval: Duration,
    // Earliest instant the next call may start. The tokio mutex is fair, so
    // queued callers proceed in arrival order.
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                min_interval,
                next_slot: Mutex::new(None),
            }),
        }
    }

    /// Runs `op` once a slot is available. The slot is held for the whole
    /// duration of `op`, so there is never more than one outstanding call.
    pub async fn schedule<F, Fut, T>(&self, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut next_slot = self.inner.next_slot.lock().await;
        if let Some(at) = *next_slot {
            tokio::time::sleep_until(at).await;
        }
        *next_slot = Some(Instant::now() + self.inner.min_interval);
        op().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[tokio::test(start_paused = true)]
    async fn spaces_concurrent_calls_by_min_interval() {
        let limiter = RateLimiter::new(Duration::from_secs(6));
        let starts: Arc<StdMutex<Vec<(usize, Instant)>>> = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..3 {
            let limiter = limiter.clone();
            let starts = starts.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .schedule(|| async {
                        starts.lock().unwrap().push((i, Instant::now()));
                    })
                    .await;
            }));
            // Let the task reach the limiter so arrival order is deterministic.
            tokio::task::yield_now().await;
        }
        for h in handles {
            h.await.unwrap();
        }

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 3);
        // Arrival order preserved.
        assert_eq!(starts.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
        // Starts spaced by at least the configured interval.
        for pair in starts.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_secs(6));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn holds_slot_for_duration_of_operation() {
        let limiter = RateLimiter::new(Duration::from_millis(10));
        let in_flight = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = limiter.clone();
            let in_flight = in_flight.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .schedule(|| async {
                        let now = in_flight.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        assert_eq!(now, 0, "more than one call in flight");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        in_flight.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }
}
