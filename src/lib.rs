//! Relay State - persistent state and caches for a chat bridge
//!
//! Provides a file-backed key store for session key material, a TTL
//! metadata cache, and a debounced refresh scheduler.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod keystore;
pub mod logging;
pub mod models;
pub mod refresh;
pub mod tasks;

pub use cache::{MessageStore, MetadataCache};
pub use config::Config;
pub use context::{BridgeContext, GroupMetadataSource};
pub use error::{RefreshError, Result, StateError};
pub use keystore::{KeyRecords, KeyStore, KeyValue};
pub use refresh::RefreshScheduler;
pub use tasks::spawn_prune_task;
