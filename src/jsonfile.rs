// Backing file operations: lock, initialize, read, atomic write

use crate::entry::Entry;
use crate::error::{Result, StoreError};
use fs2::FileExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Name of the backing file inside the storage directory
pub const STORE_FILE_NAME: &str = "keystore.json";

/// Sidecar file that carries the advisory lock.
///
/// The backing file itself is replaced by rename on every write, so a lock
/// taken on it would be left behind on the old inode.
pub const LOCK_FILE_NAME: &str = "keystore.json.lock";

/// How a store handle uses the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `get`/`list` only; takes a shared lock
    ReadOnly,
    /// May persist; takes an exclusive lock
    ReadWrite,
}

/// Take an advisory lock on the storage directory.
///
/// `ReadWrite` takes an exclusive lock and blocks until every other holder
/// drops its handle. `ReadOnly` takes a shared lock, and if the lock file
/// cannot be created or opened for lack of permission it returns `None` and
/// the caller reads without a lock. The lock is released when the returned
/// file is dropped.
pub fn lock(dir: &Path, access: Access) -> Result<Option<File>> {
    if !dir.is_dir() {
        return Err(StoreError::io(
            dir,
            io::Error::new(io::ErrorKind::NotFound, "storage directory does not exist"),
        ));
    }

    let lock_path = dir.join(LOCK_FILE_NAME);

    let file = match access {
        Access::ReadWrite => {
            let file = open_lock_file(&lock_path).map_err(|e| StoreError::io(&lock_path, e))?;
            FileExt::lock_exclusive(&file).map_err(|e| StoreError::io(&lock_path, e))?;
            file
        }
        Access::ReadOnly => {
            let opened = match open_lock_file(&lock_path) {
                Err(e) if lock_unavailable(&e) => File::open(&lock_path),
                other => other,
            };
            let file = match opened {
                Ok(file) => file,
                Err(e) if lock_unavailable(&e) || e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = ?lock_path, error = %e, "Store lock unavailable, reading without it");
                    return Ok(None);
                }
                Err(e) => return Err(StoreError::io(&lock_path, e)),
            };
            FileExt::lock_shared(&file).map_err(|e| StoreError::io(&lock_path, e))?;
            file
        }
    };

    debug!(path = ?lock_path, ?access, "Acquired store lock");
    Ok(Some(file))
}

fn open_lock_file(lock_path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)
}

/// Errors that mean the directory is not ours to write
fn lock_unavailable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem
    )
}

/// Create the backing file containing `{}` if it does not exist yet.
///
/// Returns true if the file was created.
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    fs::write(path, "{}").map_err(|e| StoreError::io(path, e))?;
    info!(file = ?path, "Created empty store file");
    Ok(true)
}

/// Read and parse the backing file
pub fn read_entries(path: &Path) -> Result<BTreeMap<String, Entry>> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;

    let entries: BTreeMap<String, Entry> = serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(file = ?path, count = entries.len(), "Loaded store file");
    Ok(entries)
}

/// Replace the file at `path` with the compact JSON encoding of `value`.
///
/// The new content goes to a temporary file in the same directory first and
/// is renamed over the target, so readers never see a partial write.
pub fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_string(value)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(json.as_bytes()).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| StoreError::io(tmp.path(), e))?;

    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    debug!(file = ?path, bytes = json.len(), "Wrote store file");

    Ok(())
}
