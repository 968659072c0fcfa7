use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

use super::KeyValueStore;

/// Store file name in the data directory
const STORE_FILE: &str = "auth_store.json";

type Entries = BTreeMap<String, String>;

/// All keys live in one JSON object on disk. Every operation re-reads the
/// file so other handles on the same directory see each other's writes.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORE_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read auth store file")?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&contents).context("Failed to parse auth store file")
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove auth store file")?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).context("Failed to write auth store file")?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        // An unreadable file is replaced rather than blocking the removal
        let mut entries = self.load().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable auth store");
            Entries::new()
        });
        for key in keys {
            entries.remove(*key);
        }
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("@auth_token").unwrap(), None);
    }

    #[test]
    fn test_set_creates_directory_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("brewing-app");
        let store = FileStore::new(&nested);

        store.set("@auth_token", "tok").unwrap();
        assert!(store.path().exists());

        let reopened = FileStore::new(&nested);
        assert_eq!(reopened.get("@auth_token").unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn test_remove_many_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("c", "3").unwrap();

        store.remove_many(&["a", "b", "missing"]).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("c").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_remove_all_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("a", "1").unwrap();
        store.remove_many(&["a"]).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_unreadable_file_errors_on_get_but_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(store.get("a").is_err());
        store.remove_many(&["a"]).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }
}
