//! In-process key-value store.

use super::{KvError, KvResult, KvStore};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Map-backed store for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    records: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.records.lock().map_or(0, |records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryKvStore {
    fn get_item(&self, key: &str) -> KvResult<Option<String>> {
        let records = self
            .records
            .lock()
            .map_err(|_| KvError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(records.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> KvResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| KvError::Unavailable("memory store lock poisoned".to_string()))?;
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> KvResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| KvError::Unavailable("memory store lock poisoned".to_string()))?;
        records.remove(key);
        Ok(())
    }
}
