// Error taxonomy for the key/value store

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a store invocation.
///
/// A missing key is not represented here: `get` returns `None` and `remove`
/// returns `false`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage directory was not provided, or its config file is unusable
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backing file exists but is not a JSON object of entries
    #[error("corrupt store file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mutation was attempted through a handle opened for reading
    #[error("store {} was opened read-only", path.display())]
    ReadOnly { path: PathBuf },

    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
