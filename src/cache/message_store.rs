//! Message Store Module
//!
//! Bounded TTL store of recently relayed messages, used to resolve quotes,
//! edits and reactions that reference an earlier message.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, InsertionOrder};
use crate::models::MessageKey;

// == Message Store ==
#[derive(Debug)]
pub struct MessageStore<M> {
    entries: HashMap<String, CacheEntry<M>>,
    order: InsertionOrder,
    ttl: Duration,
    max_entries: usize,
}

impl<M> MessageStore<M> {
    /// Creates an empty store holding at most `max_entries` messages for `ttl` each.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            ttl,
            max_entries,
        }
    }

    // == Set ==
    /// Stores `message` under `key`, dropping the oldest messages past capacity.
    ///
    /// Returns false when the key has no message id and nothing was stored.
    pub fn set(&mut self, key: &MessageKey, message: M) -> bool {
        let Some(cache_key) = key.cache_key() else {
            return false;
        };

        self.order.touch(&cache_key);
        self.entries
            .insert(cache_key, CacheEntry::new(message, self.ttl));

        while self.entries.len() > self.max_entries {
            match self.order.pop_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        true
    }

    // == Get ==
    /// Returns the message for `key` unless it is missing or expired.
    pub fn get(&mut self, key: &MessageKey) -> Option<&M> {
        let cache_key = key.cache_key()?;
        let expired = self.entries.get(&cache_key)?.is_expired();
        if expired {
            self.entries.remove(&cache_key);
            self.order.remove(&cache_key);
            return None;
        }
        self.entries.get(&cache_key).map(|entry| &entry.value)
    }

    // == Prune ==
    /// Removes expired messages and returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.order.remove(key);
        }
        expired.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
