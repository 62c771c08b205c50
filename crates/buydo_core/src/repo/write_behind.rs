//! Write-behind persistence jobs.
//!
//! Every mutation enqueues the full resulting snapshot of the collection it
//! touched. Jobs are coalesced per collection, so the last enqueued snapshot
//! for a key always wins and intermediate snapshots are never written.

use super::entity_repo::{EntityRepository, RepoResult};
use super::{CollectionKey, StorageKeys};
use crate::kv::KvStore;
use crate::model::note::Note;
use crate::model::shopping::{ShoppingItem, Store};
use crate::model::todo::TodoTask;
use log::{error, info};
use std::collections::BTreeMap;

/// Full collection state captured at mutation time.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionSnapshot {
    Stores(Vec<Store>),
    Items(Vec<ShoppingItem>),
    Todos(Vec<TodoTask>),
    Notes(Vec<Note>),
}

impl CollectionSnapshot {
    pub fn key(&self) -> CollectionKey {
        match self {
            Self::Stores(_) => CollectionKey::Stores,
            Self::Items(_) => CollectionKey::Items,
            Self::Todos(_) => CollectionKey::Todos,
            Self::Notes(_) => CollectionKey::Notes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Stores(records) => records.len(),
            Self::Items(records) => records.len(),
            Self::Todos(records) => records.len(),
            Self::Notes(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist<K: KvStore>(&self, repo: &EntityRepository<K>, key: &str) -> RepoResult<()> {
        match self {
            Self::Stores(records) => repo.try_save(key, records),
            Self::Items(records) => repo.try_save(key, records),
            Self::Todos(records) => repo.try_save(key, records),
            Self::Notes(records) => repo.try_save(key, records),
        }
    }
}

/// Outcome of draining the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: Vec<CollectionKey>,
    pub failed: Vec<CollectionKey>,
}

impl FlushReport {
    /// True when every drained job was written.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pending persistence jobs, at most one per collection.
#[derive(Debug, Default)]
pub struct WriteBehindQueue {
    pending: BTreeMap<CollectionKey, CollectionSnapshot>,
    coalesced: u64,
}

impl WriteBehindQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `snapshot`, replacing any pending job for the same collection.
    ///
    /// Returns `true` when an older pending job was superseded.
    pub fn enqueue(&mut self, snapshot: CollectionSnapshot) -> bool {
        let superseded = self.pending.insert(snapshot.key(), snapshot).is_some();
        if superseded {
            self.coalesced += 1;
        }
        superseded
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Collections with a pending job, in key order.
    pub fn pending_keys(&self) -> Vec<CollectionKey> {
        self.pending.keys().copied().collect()
    }

    /// Pending snapshot for `key`, if any.
    pub fn pending(&self, key: CollectionKey) -> Option<&CollectionSnapshot> {
        self.pending.get(&key)
    }

    /// Number of jobs dropped because a newer snapshot replaced them.
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }

    /// Removes and returns all pending jobs in key order.
    pub fn drain(&mut self) -> Vec<CollectionSnapshot> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    /// Writes every pending job. Failed jobs are logged and dropped; the next
    /// mutation of that collection enqueues a fresh full snapshot.
    pub fn flush<K: KvStore>(
        &mut self,
        repo: &EntityRepository<K>,
        keys: &StorageKeys,
    ) -> FlushReport {
        let mut report = FlushReport::default();
        for snapshot in self.drain() {
            let collection = snapshot.key();
            let key = keys.collection(collection);
            match snapshot.persist(repo, &key) {
                Ok(()) => report.written.push(collection),
                Err(err) => {
                    error!(
                        "event=write_behind_flush module=repo status=error key={key} count={} error={err}",
                        snapshot.len()
                    );
                    report.failed.push(collection);
                }
            }
        }
        if !report.written.is_empty() || !report.failed.is_empty() {
            info!(
                "event=write_behind_flush module=repo status={} written={} failed={}",
                if report.is_clean() { "ok" } else { "error" },
                report.written.len(),
                report.failed.len()
            );
        }
        report
    }
}
