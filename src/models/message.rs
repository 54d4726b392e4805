//! Message addressing
//!
//! Identifies a relayed message by chat and message id.

use serde::{Deserialize, Serialize};

/// Key of a relayed message as reported by the chat client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    #[serde(default)]
    pub remote_jid: String,
    /// Sender inside a group chat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(default)]
    pub id: String,
}

impl MessageKey {
    pub fn new(remote_jid: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            remote_jid: remote_jid.into(),
            participant: None,
            id: id.into(),
        }
    }

    /// Lookup key `<chat>|<id>`; None when the message id is missing.
    ///
    /// Falls back to the participant when the chat JID is empty.
    pub fn cache_key(&self) -> Option<String> {
        if self.id.is_empty() {
            return None;
        }
        let chat = if self.remote_jid.is_empty() {
            self.participant.as_deref().unwrap_or_default()
        } else {
            self.remote_jid.as_str()
        };
        Some(format!("{}|{}", chat, self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        let key = MessageKey::new("chat@g.us", "ABC");
        assert_eq!(key.cache_key().as_deref(), Some("chat@g.us|ABC"));
    }

    #[test]
    fn test_cache_key_participant_fallback() {
        let key = MessageKey {
            remote_jid: String::new(),
            participant: Some("p@s.whatsapp.net".to_string()),
            id: "X".to_string(),
        };
        assert_eq!(key.cache_key().as_deref(), Some("p@s.whatsapp.net|X"));
    }

    #[test]
    fn test_cache_key_requires_id() {
        assert!(MessageKey::new("chat@g.us", "").cache_key().is_none());
    }

    #[test]
    fn test_deserialize_client_key() {
        let key: MessageKey =
            serde_json::from_str(r#"{"remoteJid":"chat@g.us","fromMe":false,"id":"ABC"}"#)
                .unwrap();
        assert_eq!(key, MessageKey::new("chat@g.us", "ABC"));
    }
}
