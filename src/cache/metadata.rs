//! Metadata Cache Module
//!
//! TTL cache over immutable metadata snapshots (group subjects, participant
//! lists). Validity is checked on every read, so `prune` only reclaims memory.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};

// == Metadata Cache ==
/// In-memory snapshot cache with a single TTL applied to every entry.
#[derive(Debug)]
pub struct MetadataCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
    ttl: Duration,
}

impl<V> MetadataCache<V> {
    // == Constructor ==
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            ttl,
        }
    }

    /// Creates an empty cache from a TTL expressed in milliseconds.
    pub fn with_ttl_ms(ttl_ms: u64) -> Self {
        Self::new(Duration::from_millis(ttl_ms))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Set ==
    /// Inserts or overwrites `key`, restarting its lifetime.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries
            .insert(key.into(), CacheEntry::new(value, self.ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the snapshot for `key` if present and not expired.
    ///
    /// An expired entry is dropped on the spot and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Prime ==
    /// Bulk-inserts snapshots, all stamped with the same insertion time.
    ///
    /// Returns the number of entries written.
    pub fn prime<I, K>(&mut self, snapshots: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let inserted_at = Instant::now();
        let mut count = 0;
        for (key, value) in snapshots {
            self.entries.insert(
                key.into(),
                CacheEntry {
                    value,
                    inserted_at,
                    ttl: self.ttl,
                },
            );
            count += 1;
        }
        self.stats.set_total_entries(self.entries.len());
        debug!(count, "Primed metadata cache");
        count
    }

    // == Invalidate ==
    /// Drops `key` immediately regardless of its remaining lifetime.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_invalidation();
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Prune ==
    /// Removes every entry whose lifetime has elapsed.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        self.stats.record_pruned(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Removes every entry, valid or not.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Length ==
    /// Number of physically held entries, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}
