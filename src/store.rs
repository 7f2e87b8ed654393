// Key/value store backed by a single JSON file

use crate::config::Config;
use crate::entry::Entry;
use crate::error::{Result, StoreError};
use crate::jsonfile::{self, Access};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle on one storage directory's `keystore.json`
///
/// A read-write handle holds an exclusive advisory lock on the directory from
/// open until drop, so one handle's read-modify-write cycle cannot interleave
/// with another's. Read-only handles share the lock with each other.
pub struct Store {
    path: PathBuf,
    entries: BTreeMap<String, Entry>,
    access: Access,
    _lock: Option<File>,
}

impl Store {
    /// Open the store in `dir` for reading and writing, creating
    /// `keystore.json` with `{}` if absent.
    ///
    /// The directory itself must already exist.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with_access(dir, Access::ReadWrite)
    }

    /// Open the store in `dir` for `get`/`list` only.
    ///
    /// Works in directories the caller cannot write, as long as
    /// `keystore.json` already exists there.
    pub fn open_read_only<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with_access(dir, Access::ReadOnly)
    }

    pub fn open_with_access<P: AsRef<Path>>(dir: P, access: Access) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join(jsonfile::STORE_FILE_NAME);

        let lock = jsonfile::lock(dir, access)?;
        jsonfile::init_if_missing(&path)?;
        let entries = jsonfile::read_entries(&path)?;

        info!(file = ?path, count = entries.len(), ?access, locked = lock.is_some(), "Opened store");

        Ok(Self {
            path,
            entries,
            access,
            _lock: lock,
        })
    }

    /// Open the store in the directory named by `config`
    pub fn open_with_config(config: &Config, access: Access) -> Result<Self> {
        Self::open_with_access(config.store_dir(), access)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Insert or overwrite `key`, then persist.
    ///
    /// Always returns true; failures come back as `Err` and leave the handle
    /// unchanged.
    pub fn add(&mut self, key: &str, value: &str) -> Result<bool> {
        self.ensure_writable()?;

        let entry = Entry::new(value);
        debug!(key, type_tag = %entry.type_tag, "add");

        let mut updated = self.entries.clone();
        let previous = updated.insert(key.to_string(), entry);
        self.replace(updated)?;

        if previous.is_some() {
            info!(key, "Overwrote entry");
        } else {
            info!(key, "Added entry");
        }
        Ok(true)
    }

    /// The whole store as a compact JSON object
    pub fn list(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Raw value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Full entry, tag included
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Delete `key` and persist. Returns false without writing if absent.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        self.ensure_writable()?;

        if !self.entries.contains_key(key) {
            debug!(key, "remove: key not found");
            return Ok(false);
        }

        let mut updated = self.entries.clone();
        updated.remove(key);
        self.replace(updated)?;

        info!(key, "Removed entry");
        Ok(true)
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.access {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(StoreError::ReadOnly {
                path: self.path.clone(),
            }),
        }
    }

    /// Persist `updated`, and only then make it the in-memory state
    fn replace(&mut self, updated: BTreeMap<String, Entry>) -> Result<()> {
        jsonfile::write_atomic(&self.path, &updated)?;
        self.entries = updated;
        Ok(())
    }
}
