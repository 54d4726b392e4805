//! Group metadata snapshot
//!
//! The shape the chat client reports for a group chat, as cached by the bridge.

use serde::{Deserialize, Serialize};

/// Snapshot of a group chat's metadata at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    /// Group JID
    pub id: String,
    /// Display subject of the group
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Creation time in unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<i64>,
    #[serde(default)]
    pub participants: Vec<GroupParticipant>,
}

/// A member of a group chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupParticipant {
    pub id: String,
    /// `admin`, `superadmin`, or absent for regular members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
}

impl GroupMetadata {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            desc: None,
            owner: None,
            creation: None,
            participants: Vec::new(),
        }
    }
}
