//! Background Tasks Module
//!
//! Maintenance tasks that run periodically while the bridge is up.
//!
//! # Tasks
//! - Prune: reclaims expired cache entries at configured intervals

mod prune;

pub use prune::{spawn_prune_task, Prune};
