//! Cache Prune Task
//!
//! Background task that periodically reclaims expired cache entries.
//! Reads never depend on it; it only bounds memory use.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{MessageStore, MetadataCache};

/// A cache whose expired entries can be swept in one pass.
pub trait Prune {
    /// Removes expired entries and returns how many were dropped.
    fn prune(&mut self) -> usize;
}

impl<V> Prune for MetadataCache<V> {
    fn prune(&mut self) -> usize {
        MetadataCache::prune(self)
    }
}

impl<M> Prune for MessageStore<M> {
    fn prune(&mut self) -> usize {
        MessageStore::prune(self)
    }
}

/// Spawns a task that prunes `cache` every `interval`.
///
/// The returned handle is aborted on shutdown.
///
/// # Example
/// ```ignore
/// let groups = Arc::new(RwLock::new(MetadataCache::new(Duration::from_secs(300))));
/// let handle = spawn_prune_task("group-metadata", groups.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_prune_task<C>(
    name: &'static str,
    cache: Arc<RwLock<C>>,
    interval: Duration,
) -> JoinHandle<()>
where
    C: Prune + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            cache = name,
            "Starting prune task with interval of {:?}", interval
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut guard = cache.write().await;
                guard.prune()
            };

            if removed > 0 {
                info!(cache = name, "Pruned {} expired entries", removed);
            } else {
                debug!(cache = name, "No expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_prune_task_removes_expired_entries() {
        let cache = Arc::new(RwLock::new(MetadataCache::new(Duration::from_millis(100))));
        cache.write().await.set("expire_soon", 1);

        let handle = spawn_prune_task("test", cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(175)).await;
        assert_eq!(cache.read().await.len(), 0, "Expired entry should be reclaimed");
        assert_eq!(cache.read().await.stats().pruned, 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_task_preserves_valid_entries() {
        let cache = Arc::new(RwLock::new(MetadataCache::new(Duration::from_secs(3600))));
        cache.write().await.set("long_lived", 1);

        let handle = spawn_prune_task("test", cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(175)).await;
        assert_eq!(cache.write().await.get("long_lived"), Some(&1));

        handle.abort();
    }

    #[tokio::test]
    async fn test_prune_task_can_be_aborted() {
        let store: Arc<RwLock<MessageStore<()>>> =
            Arc::new(RwLock::new(MessageStore::new(Duration::from_secs(1), 10)));

        let handle = spawn_prune_task("messages", store, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
