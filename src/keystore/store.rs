//! Key Store Module
//!
//! File-backed store for session key material, one JSON file per
//! `(category, id)` pair. Writes go to a private temp directory first and
//! are renamed into place, so a reader never sees a half-written record.
//! The directory is synced after each rename so a completed write also
//! survives a power loss.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Result, StateError};
use crate::keystore::naming::{
    category_prefix, is_digest_file_name, parse_record_file_name, record_file_name, RecordId,
};
use crate::keystore::KeyValue;

const STORAGE_DIR_MODE: u32 = 0o700;
const STORAGE_FILE_MODE: u32 = 0o600;
const TEMP_DIR_NAME: &str = ".tmp";
const CREDS_FILE_NAME: &str = "creds.json";

/// Records to write, grouped by category then id. `None` deletes the record.
pub type KeyRecords = HashMap<String, HashMap<String, Option<KeyValue>>>;

// == Key Store ==
#[derive(Debug)]
pub struct KeyStore {
    root: PathBuf,
    temp_dir: PathBuf,
    temp_seq: AtomicU64,
}

impl KeyStore {
    // == Open ==
    /// Opens (creating if needed) the store rooted at `root`.
    ///
    /// Temp files left behind by an interrupted write are discarded.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StateError::storage(&root, e))?;
        if let Err(e) = restrict_permissions(&root, STORAGE_DIR_MODE).await {
            warn!(path = %root.display(), error = %e, "Could not restrict key store directory permissions");
        }

        let temp_dir = root.join(TEMP_DIR_NAME);
        match fs::remove_dir_all(&temp_dir).await {
            Ok(()) => debug!("Discarded stale temp files"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StateError::storage(&temp_dir, e)),
        }
        fs::create_dir(&temp_dir)
            .await
            .map_err(|e| StateError::storage(&temp_dir, e))?;

        info!(path = %root.display(), "Key store opened");
        Ok(Self {
            root,
            temp_dir,
            temp_seq: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // == Set ==
    /// Persists every record in `records`; `None` values delete their record.
    ///
    /// Records are written one after another and the first failure is returned.
    /// Categories need no registration.
    pub async fn set(&self, records: KeyRecords) -> Result<()> {
        for (category, ids) in records {
            for (id, value) in ids {
                let name = record_file_name(&category, &id)?;
                let path = self.root.join(&name);
                match value {
                    Some(value) => {
                        let body = record_body(&id, &value, is_digest_file_name(&name));
                        let bytes = serde_json::to_vec(&body)?;
                        self.write_atomic(&path, &bytes).await?;
                        debug!(%category, %id, "Key record written");
                    }
                    None => {
                        self.remove_file(&path).await?;
                        debug!(%category, %id, "Key record removed");
                    }
                }
            }
        }
        Ok(())
    }

    // == Get ==
    /// Reads the records `ids` of `category`.
    ///
    /// Ids without a record are left out of the result. A record that cannot
    /// be parsed is treated as missing; an I/O failure is an error.
    pub async fn get<S: AsRef<str>>(
        &self,
        category: &str,
        ids: &[S],
    ) -> Result<HashMap<String, KeyValue>> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            let name = record_file_name(category, id)?;
            let path = self.root.join(&name);
            let Some(bytes) = self.read_file(&path).await? else {
                continue;
            };

            let value = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| read_body(id, body, is_digest_file_name(&name)));
            match value {
                Some(value) => {
                    found.insert(id.to_string(), value);
                }
                None => {
                    warn!(path = %path.display(), "Ignoring unreadable key record");
                }
            }
        }
        Ok(found)
    }

    // == List ==
    /// Returns the ids of every record persisted under `category`, sorted.
    pub async fn list(&self, category: &str) -> Result<Vec<String>> {
        let prefix = category_prefix(category)?;
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StateError::storage(&self.root, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StateError::storage(&self.root, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(&prefix) {
                continue;
            }
            match parse_record_file_name(name) {
                Some((_, RecordId::Plain(id))) => ids.push(id),
                Some((_, RecordId::Digest)) => {
                    if let Some(id) = self.read_inline_id(category, name).await? {
                        ids.push(id);
                    }
                }
                None => {}
            }
        }
        ids.sort();
        Ok(ids)
    }

    // == Credentials ==
    /// Loads the session credentials document, None if never saved or unreadable.
    pub async fn load_creds<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let path = self.root.join(CREDS_FILE_NAME);
        let Some(bytes) = self.read_file(&path).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(creds) => Ok(Some(creds)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable credentials");
                Ok(None)
            }
        }
    }

    /// Replaces the session credentials document.
    pub async fn save_creds<T: Serialize>(&self, creds: &T) -> Result<()> {
        let bytes = serde_json::to_vec(creds)?;
        self.write_atomic(&self.root.join(CREDS_FILE_NAME), &bytes)
            .await
    }

    /// Reads the id stored inside a digest-named record.
    async fn read_inline_id(&self, category: &str, name: &str) -> Result<Option<String>> {
        let path = self.root.join(name);
        let Some(bytes) = self.read_file(&path).await? else {
            return Ok(None);
        };
        let id = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|body| body.get("id")?.as_str().map(str::to_string))
            .filter(|id| record_file_name(category, id).is_ok_and(|expected| expected == name));
        if id.is_none() {
            warn!(path = %path.display(), "Ignoring unreadable key record");
        }
        Ok(id)
    }

    // == File Helpers ==
    async fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateError::storage(path, e)),
        }
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::storage(path, e)),
        }
    }

    /// Writes `bytes` to a fresh temp file, syncs it, renames it over `path`,
    /// then syncs the directory holding `path`.
    ///
    /// On failure the temp file is removed and `path` keeps its previous content.
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("record");
        let temp_path = self.temp_dir.join(format!("{}.{}", file_name, seq));

        let written: std::io::Result<()> = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            restrict_permissions(&temp_path, STORAGE_FILE_MODE).await?;
            fs::rename(&temp_path, path).await?;
            sync_dir(path.parent().unwrap_or(self.root.as_path())).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StateError::storage(path, e));
        }
        Ok(())
    }
}

/// Builds the file body for a record. Digest-named records carry their id.
fn record_body(id: &str, value: &KeyValue, inline_id: bool) -> Value {
    let envelope = value.to_envelope();
    if inline_id {
        json!({"id": id, "value": envelope})
    } else {
        envelope
    }
}

fn read_body(id: &str, body: Value, inline_id: bool) -> Option<KeyValue> {
    if !inline_id {
        return KeyValue::from_envelope(body);
    }
    let Value::Object(mut fields) = body else {
        return None;
    };
    if fields.get("id")?.as_str()? != id {
        return None;
    }
    KeyValue::from_envelope(fields.remove("value")?)
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
