//! Bridge Context
//!
//! Owns the key store, the group metadata cache, the message store and the
//! refresh scheduler, and is passed explicitly to whichever handler needs them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{MessageStore, MetadataCache};
use crate::config::Config;
use crate::error::Result;
use crate::keystore::KeyStore;
use crate::models::GroupMetadata;
use crate::refresh::RefreshScheduler;
use crate::tasks::spawn_prune_task;

/// Shared group metadata cache.
pub type GroupCache = Arc<RwLock<MetadataCache<GroupMetadata>>>;

/// Shared store of relayed messages, kept as raw client payloads.
pub type SharedMessageStore = Arc<RwLock<MessageStore<Value>>>;

// == Group Metadata Source ==
/// Where fresh group metadata comes from, implemented by the chat client.
#[async_trait]
pub trait GroupMetadataSource: Send + Sync {
    /// Fetches the current metadata of one group.
    async fn fetch_group(&self, jid: &str) -> anyhow::Result<GroupMetadata>;

    /// Fetches the metadata of every group the account belongs to, keyed by JID.
    async fn fetch_all_groups(&self) -> anyhow::Result<HashMap<String, GroupMetadata>>;
}

// == Bridge Context ==
pub struct BridgeContext {
    config: Config,
    keys: KeyStore,
    groups: GroupCache,
    messages: SharedMessageStore,
    refresh: RefreshScheduler,
    source: Arc<dyn GroupMetadataSource>,
    maintenance: Mutex<Vec<JoinHandle<()>>>,
}

impl BridgeContext {
    // == Open ==
    /// Opens the key store and builds empty caches from `config`.
    ///
    /// Refreshes fetch from `source` and write back into the group cache.
    pub async fn open(config: Config, source: Arc<dyn GroupMetadataSource>) -> Result<Self> {
        let keys = KeyStore::open(config.state_dir.clone()).await?;
        let groups: GroupCache = Arc::new(RwLock::new(MetadataCache::new(
            config.group_metadata_ttl(),
        )));
        let messages: SharedMessageStore = Arc::new(RwLock::new(MessageStore::new(
            config.message_ttl(),
            config.message_max_entries,
        )));

        let refresh = {
            let source = Arc::clone(&source);
            let groups = Arc::clone(&groups);
            RefreshScheduler::new(config.group_refresh_delay(), move |jid: String| {
                let source = Arc::clone(&source);
                let groups = Arc::clone(&groups);
                async move {
                    let metadata = source.fetch_group(&jid).await?;
                    groups.write().await.set(jid, metadata);
                    Ok::<(), anyhow::Error>(())
                }
            })
        };

        info!(
            "State context ready: group_ttl={}ms, refresh_delay={}ms, message_capacity={}",
            config.group_metadata_ttl_ms, config.group_refresh_delay_ms, config.message_max_entries
        );

        Ok(Self {
            config,
            keys,
            groups,
            messages,
            refresh,
            source,
            maintenance: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn groups(&self) -> &GroupCache {
        &self.groups
    }

    pub fn messages(&self) -> &SharedMessageStore {
        &self.messages
    }

    pub fn refresh(&self) -> &RefreshScheduler {
        &self.refresh
    }

    // == Group Metadata ==
    /// Returns cached metadata for `jid`.
    ///
    /// On a miss a debounced refresh is scheduled and None is returned; the
    /// refreshed snapshot is served by a later call.
    pub async fn group_metadata(&self, jid: &str) -> Option<GroupMetadata> {
        if jid.is_empty() {
            return None;
        }
        let cached = self.groups.write().await.get(jid).cloned();
        if cached.is_none() {
            debug!(%jid, "Group metadata miss, scheduling refresh");
            self.refresh.schedule(jid);
        }
        cached
    }

    /// Drops the cached snapshot of `jid` and schedules a refresh.
    ///
    /// Called when the client reports a participant or subject change.
    pub async fn on_group_update(&self, jid: &str) {
        if jid.is_empty() {
            return;
        }
        self.groups.write().await.invalidate(jid);
        self.refresh.schedule(jid);
    }

    /// Fetches every group and primes the cache with the result.
    ///
    /// Returns the number of groups cached.
    pub async fn refresh_all_groups(&self) -> anyhow::Result<usize> {
        let all = self.source.fetch_all_groups().await?;
        let count = self.groups.write().await.prime(all);
        info!("Primed group metadata for {} groups", count);
        Ok(count)
    }

    // == Maintenance ==
    /// Starts the background prune tasks for both caches.
    pub fn start_maintenance(&self) {
        let interval = std::time::Duration::from_secs(self.config.prune_interval);
        let mut tasks = self
            .maintenance
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        tasks.push(spawn_prune_task(
            "group-metadata",
            Arc::clone(&self.groups),
            interval,
        ));
        tasks.push(spawn_prune_task(
            "messages",
            Arc::clone(&self.messages),
            interval,
        ));
    }

    // == Shutdown ==
    /// Cancels pending refreshes and stops background tasks.
    pub fn shutdown(&self) {
        let canceled = self.refresh.clear_all();
        let tasks: Vec<JoinHandle<()>> = self
            .maintenance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in &tasks {
            task.abort();
        }
        info!(
            canceled_refreshes = canceled,
            stopped_tasks = tasks.len(),
            "State context shut down"
        );
    }
}
