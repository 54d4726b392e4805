//! Cache Entry Module
//!
//! Defines a single cached snapshot with its insertion time and lifetime.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and age metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored snapshot
    pub value: V,
    /// When the entry was written
    pub inserted_at: Instant,
    /// Lifetime shared by every entry of the owning cache
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// Boundary condition: an entry is expired once `now - inserted_at >= ttl`,
    /// so a zero TTL entry is never readable.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }

    /// Checks if the entry has expired as of the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}
