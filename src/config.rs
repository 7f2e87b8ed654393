// Storage directory resolution

use crate::error::{Result, StoreError};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the storage directory
pub const STORE_PATH_ENV: &str = "KEY_STORE_PATH";

/// Resolved configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    store_dir: PathBuf,
}

/// On-disk shape of `<config_dir>/keystore/config.yaml`
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    store_path: Option<PathBuf>,
}

impl Config {
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    /// Resolve from the process environment.
    ///
    /// Precedence: the explicit `flag`, then `KEY_STORE_PATH`, then the user
    /// config file.
    pub fn resolve(flag: Option<PathBuf>) -> Result<Self> {
        Self::from_sources(flag, std::env::var_os(STORE_PATH_ENV), default_config_file().as_deref())
    }

    /// Resolve from explicitly supplied sources
    pub fn from_sources(flag: Option<PathBuf>, env: Option<OsString>, config_file: Option<&Path>) -> Result<Self> {
        if let Some(dir) = flag {
            debug!(dir = ?dir, "Using store path from command line");
            return Ok(Self::new(dir));
        }

        if let Some(dir) = env.filter(|v| !v.is_empty()) {
            debug!(dir = ?dir, "Using store path from {}", STORE_PATH_ENV);
            return Ok(Self::new(dir));
        }

        if let Some(path) = config_file.filter(|p| p.exists()) {
            if let Some(dir) = read_config_file(path)?.store_path {
                debug!(dir = ?dir, file = ?path, "Using store path from config file");
                return Ok(Self::new(dir));
            }
        }

        Err(StoreError::Configuration(format!(
            "no storage directory configured; set {} or pass --store-path",
            STORE_PATH_ENV
        )))
    }

    /// Directory holding the backing file
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }
}

/// `<config_dir>/keystore/config.yaml`, if the platform has a config dir
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keystore").join("config.yaml"))
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| StoreError::Configuration(format!("failed to read {}: {}", path.display(), e)))?;

    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    serde_yaml::from_str(&content)
        .map_err(|e| StoreError::Configuration(format!("failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flag_wins() {
        let config = Config::from_sources(
            Some(PathBuf::from("/from/flag")),
            Some(OsString::from("/from/env")),
            None,
        )
        .unwrap();
        assert_eq!(config.store_dir(), Path::new("/from/flag"));
    }

    #[test]
    fn test_env_used_without_flag() {
        let config = Config::from_sources(None, Some(OsString::from("/from/env")), None).unwrap();
        assert_eq!(config.store_dir(), Path::new("/from/env"));
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let err = Config::from_sources(None, Some(OsString::new()), None).unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn test_config_file_fallback() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.yaml");
        fs::write(&file, "store_path: /from/file\n").unwrap();

        let config = Config::from_sources(None, None, Some(&file)).unwrap();
        assert_eq!(config.store_dir(), Path::new("/from/file"));

        // Env still takes precedence over the file
        let config = Config::from_sources(None, Some(OsString::from("/from/env")), Some(&file)).unwrap();
        assert_eq!(config.store_dir(), Path::new("/from/env"));
    }

    #[test]
    fn test_config_file_without_store_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.yaml");
        fs::write(&file, "").unwrap();

        let err = Config::from_sources(None, None, Some(&file)).unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn test_malformed_config_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.yaml");
        fs::write(&file, "store_path: [unclosed\n").unwrap();

        let err = Config::from_sources(None, None, Some(&file)).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_nothing_configured() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("config.yaml");

        let err = Config::from_sources(None, None, Some(&missing)).unwrap_err();
        assert!(err.to_string().contains(STORE_PATH_ENV));
    }
}
