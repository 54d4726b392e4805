//! Configuration Module
//!
//! Loads state subsystem settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// State subsystem configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the key store files
    pub state_dir: PathBuf,
    /// Lifetime of a cached group metadata snapshot in milliseconds
    pub group_metadata_ttl_ms: u64,
    /// Debounce window for group metadata refreshes in milliseconds
    pub group_refresh_delay_ms: u64,
    /// Lifetime of a stored message in milliseconds
    pub message_ttl_ms: u64,
    /// Maximum number of stored messages
    pub message_max_entries: usize,
    /// Background prune interval in seconds
    pub prune_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STATE_DIR` - Key store directory (default: ./storage/auth)
    /// - `GROUP_METADATA_TTL_MS` - Group metadata TTL (default: 300000)
    /// - `GROUP_REFRESH_DELAY_MS` - Refresh debounce window (default: 750)
    /// - `MESSAGE_TTL_MS` - Stored message TTL (default: 7 days)
    /// - `MESSAGE_MAX_ENTRIES` - Stored message capacity (default: 2000)
    /// - `PRUNE_INTERVAL_SECS` - Prune frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            state_dir: env::var("STATE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            group_metadata_ttl_ms: parse_var("GROUP_METADATA_TTL_MS")
                .unwrap_or(defaults.group_metadata_ttl_ms),
            group_refresh_delay_ms: parse_var("GROUP_REFRESH_DELAY_MS")
                .unwrap_or(defaults.group_refresh_delay_ms),
            message_ttl_ms: parse_var("MESSAGE_TTL_MS").unwrap_or(defaults.message_ttl_ms),
            message_max_entries: parse_var("MESSAGE_MAX_ENTRIES")
                .unwrap_or(defaults.message_max_entries),
            prune_interval: parse_var("PRUNE_INTERVAL_SECS").unwrap_or(defaults.prune_interval),
        }
    }

    pub fn group_metadata_ttl(&self) -> Duration {
        Duration::from_millis(self.group_metadata_ttl_ms)
    }

    pub fn group_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.group_refresh_delay_ms)
    }

    pub fn message_ttl(&self) -> Duration {
        Duration::from_millis(self.message_ttl_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("./storage/auth"),
            group_metadata_ttl_ms: 5 * 60 * 1000,
            group_refresh_delay_ms: 750,
            message_ttl_ms: 7 * 24 * 60 * 60 * 1000,
            message_max_entries: 2000,
            prune_interval: 60,
        }
    }
}
