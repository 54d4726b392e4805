//! Debounced Refresh Scheduler
//!
//! Coalesces bursts of refresh requests per key into a single call of the
//! refresh callback once the key has been quiet for the configured delay.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::RefreshError;

/// Async callback invoked with the key whose debounce window elapsed.
pub type RefreshFn = Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct PendingRefresh {
    generation: u64,
    handle: JoinHandle<()>,
}

struct SchedulerInner {
    delay: Duration,
    refresh_fn: RefreshFn,
    pending: Mutex<HashMap<String, PendingRefresh>>,
    next_generation: AtomicU64,
    failures: Mutex<Option<mpsc::UnboundedSender<RefreshError>>>,
}

// == Refresh Scheduler ==
/// Per-key debounce timers in front of an async refresh callback.
///
/// Cloning is cheap; clones share the same timers.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

impl RefreshScheduler {
    // == Constructor ==
    /// Creates a scheduler that calls `refresh_fn(key)` once `key` has not
    /// been scheduled again for `delay`.
    pub fn new<F, Fut>(delay: Duration, refresh_fn: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let refresh_fn: RefreshFn = Arc::new(move |key| refresh_fn(key).boxed());
        Self {
            inner: Arc::new(SchedulerInner {
                delay,
                refresh_fn,
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                failures: Mutex::new(None),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Returns a receiver for refresh failures.
    ///
    /// Only the most recent subscriber receives failures.
    pub fn subscribe_failures(&self) -> mpsc::UnboundedReceiver<RefreshError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.inner.failures) = Some(tx);
        rx
    }

    // == Schedule ==
    /// Arms the debounce timer for `key`, restarting it if already pending.
    ///
    /// Returns immediately; the refresh runs later on its own task. Empty
    /// keys are ignored.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn schedule(&self, key: impl Into<String>) {
        let key = key.into();
        if key.is_empty() {
            return;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();

        let mut pending = lock(&self.inner.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            inner.fire(task_key, generation).await;
        });

        if let Some(previous) = pending.insert(key, PendingRefresh { generation, handle }) {
            previous.handle.abort();
            debug!(generation, "Refresh timer re-armed");
        }
    }

    // == Clear All ==
    /// Cancels every pending timer; none of them will fire.
    ///
    /// Returns the number of canceled refreshes.
    pub fn clear_all(&self) -> usize {
        let drained: Vec<PendingRefresh> = lock(&self.inner.pending)
            .drain()
            .map(|(_, pending)| pending)
            .collect();
        for pending in &drained {
            pending.handle.abort();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "Canceled pending refreshes");
        }
        drained.len()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.inner.pending).contains_key(key)
    }
}

impl SchedulerInner {
    /// Runs the refresh for `key` if this timer is still the current one.
    ///
    /// The pending entry is removed before the callback runs, so a failed
    /// refresh can be rescheduled right away.
    async fn fire(&self, key: String, generation: u64) {
        {
            let mut pending = lock(&self.pending);
            match pending.get(&key) {
                Some(current) if current.generation == generation => {
                    pending.remove(&key);
                }
                _ => return,
            }
        }

        debug!(%key, "Running scheduled refresh");
        if let Err(source) = (self.refresh_fn)(key.clone()).await {
            warn!(%key, error = %source, "Scheduled refresh failed");
            if let Some(tx) = lock(&self.failures).as_ref() {
                let _ = tx.send(RefreshError { key, source });
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(20);

    fn recording_scheduler() -> (RefreshScheduler, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let scheduler = RefreshScheduler::new(DELAY, move |key| {
            let recorded = Arc::clone(&recorded);
            async move {
                recorded.lock().unwrap().push(key);
                Ok::<(), anyhow::Error>(())
            }
        });
        (scheduler, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounces_per_key() {
        let (scheduler, calls) = recording_scheduler();

        scheduler.schedule("abc");
        scheduler.schedule("abc");
        scheduler.schedule("def");
        assert_eq!(scheduler.pending_count(), 2);
        assert!(calls.lock().unwrap().is_empty());

        sleep(Duration::from_millis(30)).await;

        let mut seen = calls.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["abc".to_string(), "def".to_string()]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_resets_timer() {
        let (scheduler, calls) = recording_scheduler();

        scheduler.schedule("abc");
        sleep(Duration::from_millis(15)).await;
        scheduler.schedule("abc");
        sleep(Duration::from_millis(15)).await;

        // The first timer would have fired at 20ms
        assert!(calls.lock().unwrap().is_empty());
        assert!(scheduler.is_pending("abc"));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_cancels_pending() {
        let (scheduler, calls) = recording_scheduler();

        scheduler.schedule("xyz");
        assert_eq!(scheduler.clear_all(), 1);
        sleep(Duration::from_millis(30)).await;
        assert!(calls.lock().unwrap().is_empty());

        scheduler.schedule("xyz");
        sleep(Duration::from_millis(30)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["xyz".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_key_ignored() {
        let (scheduler, _calls) = recording_scheduler();
        scheduler.schedule("");
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_is_reported_and_not_stuck() {
        let attempts = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&attempts);
        let scheduler = RefreshScheduler::new(DELAY, move |key| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("metadata fetch failed for {}", key))
            }
        });
        let mut failures = scheduler.subscribe_failures();

        scheduler.schedule("g1");
        sleep(Duration::from_millis(30)).await;

        let failure = failures.try_recv().unwrap();
        assert_eq!(failure.key, "g1");
        assert!(!scheduler.is_pending("g1"));

        scheduler.schedule("g1");
        assert!(scheduler.is_pending("g1"));
        sleep(Duration::from_millis(30)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
