//! Preference Storage
//!
//! The host client keeps plugin preferences as string entries under path-like
//! keys. [`PreferenceStore`] abstracts that store so the bridge can run against
//! an in-memory map in tests and a JSON file in the CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::StorageError;

type StorageResult<T> = core::result::Result<T, StorageError>;

// ----------------------------------------------------------------------------
// Storage Trait
// ----------------------------------------------------------------------------

pub trait PreferenceStore: Send {
    /// Read a string entry; `None` when the entry does not exist
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    /// Overwrite an entry, creating it when missing
    fn set_string(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Register an entry with a default value; existing values are kept
    fn add_string(&mut self, key: &str, default: &str) -> StorageResult<()>;

    fn remove(&mut self, key: &str) -> StorageResult<()>;

    fn is_available(&self) -> bool {
        true
    }
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for Box<P> {
    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_string(key)
    }

    fn set_string(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_string(key, value)
    }

    fn add_string(&mut self, key: &str, default: &str) -> StorageResult<()> {
        (**self).add_string(key, default)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

// ----------------------------------------------------------------------------
// Memory Storage
// ----------------------------------------------------------------------------

/// Preferences held in memory only
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    entries: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_string(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn add_string(&mut self, key: &str, default: &str) -> StorageResult<()> {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| default.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// File Storage
// ----------------------------------------------------------------------------

/// Preferences persisted as a JSON object, rewritten on every change
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FilePreferences {
    /// Open the file at `path`; a missing file starts empty
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!(path = %path.display(), "Preference file missing, starting empty");
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_string(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn add_string(&mut self, key: &str, default: &str) -> StorageResult<()> {
        if self.entries.contains_key(key) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), default.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.path.parent().map_or(true, |p| p.as_os_str().is_empty() || p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_add_keeps_existing() {
        let mut prefs = MemoryPreferences::new();
        prefs.add_string("/a", "").unwrap();
        assert_eq!(prefs.get_string("/a").unwrap().as_deref(), Some(""));

        prefs.set_string("/a", "value").unwrap();
        prefs.add_string("/a", "").unwrap();
        assert_eq!(prefs.get_string("/a").unwrap().as_deref(), Some("value"));

        prefs.remove("/a").unwrap();
        assert_eq!(prefs.get_string("/a").unwrap(), None);
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_file_preferences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut prefs = FilePreferences::open(&path).unwrap();
        assert!(prefs.get_string("/k").unwrap().is_none());
        prefs.set_string("/k", "aGVsbG8=").unwrap();

        let reopened = FilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get_string("/k").unwrap().as_deref(), Some("aGVsbG8="));
        assert!(reopened.is_available());
    }

    #[test]
    fn test_file_preferences_reject_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FilePreferences::open(&path),
            Err(StorageError::Serialization(_))
        ));
    }
}
