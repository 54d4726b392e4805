//! Cache Module
//!
//! In-memory TTL caches: group metadata snapshots and recently relayed messages.

mod entry;
mod message_store;
mod metadata;
mod order;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use message_store::MessageStore;
pub use metadata::MetadataCache;
pub use order::InsertionOrder;
pub use stats::CacheStats;
