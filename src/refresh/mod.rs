//! Refresh Module
//!
//! Debounced scheduling of expensive metadata refreshes.

mod scheduler;

pub use scheduler::{RefreshFn, RefreshScheduler};
