//! Persistent key-value storage for session state.
//!
//! The engine persists three things across restarts of the same host
//! context: the bearer token, the last-known user profile, and the
//! denormalized dark-mode flag (kept outside the document's load/flush
//! cycle so the theme can be applied before the document arrives).
//!
//! Storage is an explicit interface chosen at construction time:
//! `FileStorage` for real persistence, `MemoryStorage` for tests.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Storage key for the persisted bearer token.
pub const TOKEN_KEY: &str = "studydeck_token";
/// Storage key for the persisted user profile snapshot.
pub const USER_KEY: &str = "studydeck_user";
/// Storage key for the denormalized dark-mode flag.
pub const DARK_MODE_KEY: &str = "studydeck_dark_mode";

/// Directory name under the platform cache dir for file-backed storage.
const APP_DIR: &str = "studydeck-sync";

/// A persistent string key-value surface.
///
/// Failures are absorbed inside the implementation (logged, not returned):
/// losing a persisted value degrades to a fresh verify or default theme,
/// which is always a safe fallback.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// File-backed storage: one file per key under the platform cache dir.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at the platform cache directory.
    pub fn new() -> Result<Self> {
        let dir = dirs::cache_dir()
            .context("Could not find cache directory")?
            .join(APP_DIR);
        Ok(Self { dir })
    }

    /// Create storage rooted at an explicit directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                warn!(key, error = %e, "Failed to read storage key");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(self.key_path(key), value))
        {
            warn!(key, error = %e, "Failed to write storage key");
        }
    }

    fn remove(&mut self, key: &str) {
        let path = self.key_path(key);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(key, error = %e, "Failed to remove storage key");
            }
        }
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get(TOKEN_KEY), None);
        storage.set(TOKEN_KEY, "abc123");
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("abc123"));
        storage.remove(TOKEN_KEY);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn file_storage_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::with_dir(tmp.path().join("store"));
        assert_eq!(storage.get(DARK_MODE_KEY), None);
        storage.set(DARK_MODE_KEY, "true");
        assert_eq!(storage.get(DARK_MODE_KEY).as_deref(), Some("true"));
        storage.remove(DARK_MODE_KEY);
        assert_eq!(storage.get(DARK_MODE_KEY), None);
    }

    #[test]
    fn file_storage_remove_missing_key_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::with_dir(tmp.path().to_path_buf());
        storage.remove("never_set");
    }
}
