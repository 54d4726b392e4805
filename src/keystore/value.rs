//! Key Value Module
//!
//! Values persisted by the key store and their on-disk JSON envelope.
//!
//! Binary payloads are written as `{"type":"Buffer","data":"<base64>"}`;
//! structured payloads are written as-is. A structured payload that happens
//! to look like a tagged envelope is wrapped as `{"type":"Json","data":...}`
//! so that decoding stays lossless.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};

const TAG_BUFFER: &str = "Buffer";
const TAG_JSON: &str = "Json";

// == Key Value ==
/// A persisted key record: raw bytes or a structured JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Binary(Vec<u8>),
    Structured(Value),
}

impl KeyValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            KeyValue::Binary(bytes) => Some(bytes),
            KeyValue::Structured(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            KeyValue::Binary(_) => None,
            KeyValue::Structured(value) => Some(value),
        }
    }

    // == Encode ==
    /// Builds the JSON envelope written to disk.
    pub fn to_envelope(&self) -> Value {
        match self {
            KeyValue::Binary(bytes) => json!({
                "type": TAG_BUFFER,
                "data": STANDARD.encode(bytes),
            }),
            KeyValue::Structured(value) if tag_of(value).is_some() => json!({
                "type": TAG_JSON,
                "data": value,
            }),
            KeyValue::Structured(value) => value.clone(),
        }
    }

    // == Decode ==
    /// Rebuilds a value from its envelope.
    ///
    /// Returns None when a binary envelope carries invalid base64.
    pub fn from_envelope(envelope: Value) -> Option<Self> {
        match tag_of(&envelope).map(|tag| tag == TAG_BUFFER) {
            Some(true) => {
                let data = envelope.get("data")?.as_str()?;
                STANDARD.decode(data).ok().map(KeyValue::Binary)
            }
            Some(false) => {
                let Value::Object(mut fields) = envelope else {
                    return None;
                };
                fields.remove("data").map(KeyValue::Structured)
            }
            None => Some(KeyValue::Structured(envelope)),
        }
    }
}

/// Returns the envelope tag if `value` is shaped exactly like a tagged envelope.
fn tag_of(value: &Value) -> Option<&str> {
    let fields: &Map<String, Value> = value.as_object()?;
    if fields.len() != 2 || !fields.contains_key("data") {
        return None;
    }
    match fields.get("type")?.as_str()? {
        tag @ (TAG_BUFFER | TAG_JSON) => Some(tag),
        _ => None,
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(bytes: Vec<u8>) -> Self {
        KeyValue::Binary(bytes)
    }
}

impl From<&[u8]> for KeyValue {
    fn from(bytes: &[u8]) -> Self {
        KeyValue::Binary(bytes.to_vec())
    }
}

impl From<Value> for KeyValue {
    fn from(value: Value) -> Self {
        KeyValue::Structured(value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_envelope() {
        let envelope = KeyValue::from(b"rc8".as_slice()).to_envelope();
        assert_eq!(envelope, json!({"type": "Buffer", "data": "cmM4"}));
        assert_eq!(
            KeyValue::from_envelope(envelope),
            Some(KeyValue::Binary(b"rc8".to_vec()))
        );
    }

    #[test]
    fn test_structured_written_directly() {
        let value = json!("161040050426060:29@lid");
        let envelope = KeyValue::from(value.clone()).to_envelope();
        assert_eq!(envelope, value);
        assert_eq!(
            KeyValue::from_envelope(envelope),
            Some(KeyValue::Structured(value))
        );
    }

    #[test]
    fn test_structured_lookalike_is_wrapped() {
        let value = json!({"type": "Buffer", "data": "not really"});
        let envelope = KeyValue::from(value.clone()).to_envelope();
        assert_eq!(envelope["type"], "Json");
        assert_eq!(
            KeyValue::from_envelope(envelope),
            Some(KeyValue::Structured(value))
        );
    }

    #[test]
    fn test_object_with_extra_fields_not_tagged() {
        let value = json!({"type": "Buffer", "data": "AA==", "extra": 1});
        assert_eq!(KeyValue::from(value.clone()).to_envelope(), value);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let envelope = json!({"type": "Buffer", "data": "%%%"});
        assert_eq!(KeyValue::from_envelope(envelope), None);
    }

    #[test]
    fn test_accessors() {
        let binary = KeyValue::Binary(vec![1, 2]);
        assert_eq!(binary.as_bytes(), Some([1u8, 2].as_slice()));
        assert!(binary.as_json().is_none());
        assert!(KeyValue::Structured(json!(null)).as_bytes().is_none());
    }
}
