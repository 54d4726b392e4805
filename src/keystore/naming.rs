//! Record file naming
//!
//! Maps `(category, id)` to `<category>-<id>.json`. Both parts are
//! percent-encoded with `-` escaped as well, so neither part contains a raw
//! `-`. The first `-` is the separator, and `<category>-` is a filename prefix
//! that matches the records of that category and of no other.
//!
//! An id whose encoded form would push the name past `MAX_FILE_NAME_LEN` is
//! stored as `<category>-=<sha256 of id in hex>.json` instead. Percent-encoding
//! never emits a raw `=`, so digest names cannot collide with plain ones. The
//! id of a digest-named record is kept inside the file.

use sha2::{Digest, Sha256};

use crate::error::{Result, StateError};

pub const RECORD_EXTENSION: &str = ".json";

/// Longest record filename produced. Leaves room for the temp suffix under
/// the usual 255 byte limit.
pub const MAX_FILE_NAME_LEN: usize = 200;

const MAX_CATEGORY_LEN: usize = 96;
const SEPARATOR: char = '-';
const DIGEST_MARKER: char = '=';
const DIGEST_HEX_LEN: usize = 64;

/// Id part of a parsed record filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordId {
    /// Id decoded from the filename
    Plain(String),
    /// Filename carries a digest; the id is stored in the record body
    Digest,
}

fn encode_part(part: &str) -> String {
    urlencoding::encode(part).replace(SEPARATOR, "%2D")
}

fn encode_category(category: &str) -> Result<String> {
    if category.is_empty() {
        return Err(StateError::InvalidKey("category must not be empty".into()));
    }
    let encoded = encode_part(category);
    if encoded.len() > MAX_CATEGORY_LEN {
        return Err(StateError::InvalidKey(format!(
            "category encodes to {} bytes, limit is {}",
            encoded.len(),
            MAX_CATEGORY_LEN
        )));
    }
    Ok(encoded)
}

/// Filename prefix of every record of `category` and of no other category.
pub fn category_prefix(category: &str) -> Result<String> {
    let mut prefix = encode_category(category)?;
    prefix.push(SEPARATOR);
    Ok(prefix)
}

/// Filename of the record `(category, id)`.
pub fn record_file_name(category: &str, id: &str) -> Result<String> {
    let prefix = category_prefix(category)?;
    let encoded = encode_part(id);
    if prefix.len() + encoded.len() + RECORD_EXTENSION.len() <= MAX_FILE_NAME_LEN {
        return Ok(format!("{}{}{}", prefix, encoded, RECORD_EXTENSION));
    }
    let digest = Sha256::digest(id.as_bytes());
    Ok(format!(
        "{}{}{}{}",
        prefix,
        DIGEST_MARKER,
        hex::encode(digest),
        RECORD_EXTENSION
    ))
}

/// Returns true if `name` is a digest name, whose id lives in the file.
pub fn is_digest_file_name(name: &str) -> bool {
    name.split_once(SEPARATOR)
        .is_some_and(|(_, rest)| rest.starts_with(DIGEST_MARKER))
}

/// Recovers the category and id of a record filename.
///
/// Returns None for names this store did not produce (temp files, creds,
/// foreign files), checked by re-encoding the decoded parts.
pub fn parse_record_file_name(name: &str) -> Option<(String, RecordId)> {
    let stem = name.strip_suffix(RECORD_EXTENSION)?;
    let (raw_category, raw_id) = stem.split_once(SEPARATOR)?;
    let category = urlencoding::decode(raw_category).ok()?.into_owned();

    if let Some(digest) = raw_id.strip_prefix(DIGEST_MARKER) {
        let is_digest = digest.len() == DIGEST_HEX_LEN
            && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !is_digest || encode_category(&category).ok()? != raw_category {
            return None;
        }
        return Some((category, RecordId::Digest));
    }

    let id = urlencoding::decode(raw_id).ok()?.into_owned();
    if record_file_name(&category, &id).ok()? != name {
        return None;
    }
    Some((category, RecordId::Plain(id)))
}
