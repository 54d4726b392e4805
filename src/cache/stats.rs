//! Cache Statistics Module
//!
//! Tracks metadata cache activity: hits, misses, invalidations and prunes.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that returned a valid snapshot
    pub hits: u64,
    /// Reads that found nothing or an expired snapshot
    pub misses: u64,
    /// Entries dropped through `invalidate`
    pub invalidations: u64,
    /// Expired entries physically removed by `prune`
    pub pruned: u64,
    /// Current number of entries held, expired ones included
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    pub fn record_pruned(&mut self, count: usize) {
        self.pruned += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_counters() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_counters() {
        let mut stats = CacheStats::new();
        stats.record_invalidation();
        stats.record_pruned(3);
        stats.record_pruned(2);
        stats.set_total_entries(7);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.pruned, 5);
        assert_eq!(stats.total_entries, 7);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(CacheStats::new()).unwrap();
        assert_eq!(json["hits"], 0);
        assert_eq!(json["total_entries"], 0);
    }
}
