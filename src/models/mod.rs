//! Data models shared with the chat client collaborators
//!
//! Group metadata snapshots held by the metadata cache and the message keys
//! used to address stored messages.

pub mod group;
pub mod message;

// Re-export commonly used types
pub use group::{GroupMetadata, GroupParticipant};
pub use message::MessageKey;
