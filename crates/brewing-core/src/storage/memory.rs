use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};

use super::KeyValueStore;

/// In-process store. Counts every call and can be switched to fail writes,
/// which makes it the backend of choice for exercising error paths.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a call.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of get/set/remove calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("Storage is unavailable");
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_entry_is_not_counted() {
        let store = MemoryStore::new().with_entry("k", "v");
        assert_eq!(store.calls(), 0);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn test_fail_writes_keeps_reads_working() {
        let store = MemoryStore::new().with_entry("k", "v");
        store.set_fail_writes(true);
        assert!(store.set("k", "w").is_err());
        assert!(store.remove_many(&["k"]).is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
