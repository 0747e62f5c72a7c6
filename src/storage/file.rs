//! File-backed storage
//!
//! All entries live in a single JSON object. Every mutation rewrites the
//! file before returning, so a restarted process sees exactly what the last
//! completed mutation left behind.
//!
//! Writes go to a sibling temp file which is fsynced and then renamed over
//! the target, so a crash mid-write never leaves a truncated file.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{KeyValueStorage, StorageError, StorageResult};

/// Durable storage persisted as a JSON object on disk
#[derive(Debug)]
pub struct FileStorage {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory mirror of the file contents
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open or create a storage file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened storage file");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let data = serde_json::to_vec_pretty(entries)?;
        let temp = self.temp_path();

        let mut file: File = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// Apply a change to a copy, persist it, then commit it in memory.
    /// A failed write leaves the in-memory view untouched.
    fn mutate<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        let mut next = entries.clone();
        change(&mut next);
        if next == *entries {
            return Ok(());
        }

        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }
}
