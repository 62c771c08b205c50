//! Generic load/save of one typed collection.
//!
//! # Invariants
//! - `load` never fails: a missing, empty, unreadable or corrupt record yields
//!   the caller's fallback.
//! - `save` never fails: errors are logged and in-memory state stays authoritative.

use crate::kv::{KvError, KvStore};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository failure for one collection record.
#[derive(Debug)]
pub enum RepoError {
    Kv(KvError),
    /// Record exists but is not a valid JSON collection, or data failed to encode.
    Serde(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kv(err) => write!(f, "{err}"),
            Self::Serde(err) => write!(f, "invalid collection record: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kv(err) => Some(err),
            Self::Serde(err) => Some(err),
        }
    }
}

impl From<KvError> for RepoError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Typed collection access over a `KvStore`.
pub struct EntityRepository<K: KvStore> {
    kv: K,
}

impl<K: KvStore> EntityRepository<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Underlying key-value backend.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Loads the collection under `key`, or `fallback` when it cannot be read.
    pub fn load<T: DeserializeOwned>(&self, key: &str, fallback: Vec<T>) -> Vec<T> {
        match self.try_load(key) {
            Ok(Some(records)) => {
                debug!(
                    "event=collection_load module=repo status=ok key={key} count={}",
                    records.len()
                );
                records
            }
            Ok(None) => {
                debug!("event=collection_load module=repo status=skip key={key} reason=absent");
                fallback
            }
            Err(err) => {
                warn!(
                    "event=collection_load module=repo status=error key={key} error_code=load_failed error={err}"
                );
                fallback
            }
        }
    }

    /// Loads the collection under `key`; `Ok(None)` when absent or empty.
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Option<Vec<T>>> {
        match self.kv.get_item(key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Saves `data` under `key`, logging and swallowing any failure.
    pub fn save<T: Serialize>(&self, key: &str, data: &[T]) {
        if let Err(err) = self.try_save(key, data) {
            error!(
                "event=collection_save module=repo status=error key={key} error_code=save_failed error={err}"
            );
        }
    }

    /// Saves `data` under `key` as one JSON array.
    pub fn try_save<T: Serialize>(&self, key: &str, data: &[T]) -> RepoResult<()> {
        let encoded = serde_json::to_string(data)?;
        self.kv.set_item(key, &encoded)?;
        debug!(
            "event=collection_save module=repo status=ok key={key} count={}",
            data.len()
        );
        Ok(())
    }
}
