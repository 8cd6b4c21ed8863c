//! Key/value document storage.
//!
//! Documents are arbitrary JSON values addressed by a string key. The on-disk
//! layout keeps one pretty-printed file per key inside the store directory,
//! e.g. `.jsforce/connections.json`.

use anyhow::{Context, Result};
use fs2::FileExt;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// A store of JSON documents keyed by name.
///
/// `get` returns `Ok(None)` when the key has never been written. Every other
/// failure (unreadable file, malformed JSON) is an error.
pub trait DocumentStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the whole document stored under `key`.
    fn save(&self, key: &str, value: &Value) -> Result<()>;
}

/// Document store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`
    pub fn document_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{key}.lock"))
    }

    /// Open and exclusively lock the sidecar lock file for `key`.
    ///
    /// The lock is released when the returned handle is dropped.
    fn lock(&self, key: &str) -> Result<DocumentLock> {
        let path = self.lock_path(key);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to lock store document: {:?}", path))?;

        Ok(DocumentLock { file })
    }
}

impl DocumentStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.document_path(key);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "store document not found");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read store file: {:?}", path));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store file: {:?}", path))?;
        Ok(Some(value))
    }

    /// Write the document atomically: write to a temp file, then rename.
    fn save(&self, key: &str, value: &Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory: {:?}", self.dir))?;

        let _lock = self.lock(key)?;

        let path = self.document_path(key);
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize document '{}'", key))?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("Failed to write temp store file: {:?}", temp_path))?;

        std::fs::rename(&temp_path, &path).with_context(|| {
            format!("Failed to rename store file: {:?} -> {:?}", temp_path, path)
        })?;

        debug!(path = %path.display(), bytes = content.len(), "store document saved");
        Ok(())
    }
}

struct DocumentLock {
    file: File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
