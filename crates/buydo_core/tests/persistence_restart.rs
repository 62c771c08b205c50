mod common;

use buydo_core::{
    CollectionKey, Collaborators, KvStore, ManualClock, NewItem, Platform, ReactiveStore,
    SeedOutcome, SqliteKvStore, TodoDraft,
};
use common::{fixed_now, open_flaky_store, test_config, FlakyKv};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn open_at(path: &Path) -> ReactiveStore<SqliteKvStore> {
    ReactiveStore::open(
        SqliteKvStore::open(path).unwrap(),
        Collaborators::default().with_clock(ManualClock::new(fixed_now())),
        test_config(Platform::Ios),
    )
}

#[test]
fn reload_matches_last_flushed_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("buydo.sqlite3");

    let mut store = open_at(&path);
    let walmart_items = store.get_store_items("s2").len();
    let item = store.add_item("s2", NewItem::named("Batteries")).unwrap();
    store.toggle_todo_completed("t3").unwrap();
    let note = store.add_note("Groceries", None);
    store.delete_store("s3");
    let report = store.flush_pending();
    assert!(report.is_clean());
    assert_eq!(report.written, CollectionKey::ALL.to_vec());
    drop(store);

    let store = open_at(&path);
    assert_eq!(store.seed_outcome(), &SeedOutcome::AlreadySeeded);
    assert_eq!(store.get_store_items("s2").len(), walmart_items + 1);
    assert_eq!(store.item(&item.id), Some(&item));
    assert!(store.todo("t3").unwrap().is_completed);
    assert_eq!(store.note(&note.id), Some(&note));
    assert!(store.store("s3").is_none());
    assert!(store.items().iter().all(|i| i.store_id != "s3"));
}

#[test]
fn dropping_the_store_writes_pending_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("buydo.sqlite3");

    let mut store = open_at(&path);
    let task = store.add_todo(TodoDraft::new("Remembered")).unwrap().task;
    assert!(store.has_pending_writes());
    drop(store);

    let store = open_at(&path);
    assert_eq!(store.todos().len(), 5);
    assert_eq!(store.todo(&task.id), Some(&task));
}

#[test]
fn crash_before_flush_loses_only_pending_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("buydo.sqlite3");

    let mut store = open_at(&path);
    store.add_todo(TodoDraft::new("Forgotten")).unwrap();
    assert!(store.has_pending_writes());
    std::mem::forget(store);

    let store = open_at(&path);
    assert_eq!(store.todos().len(), 4);
    assert!(store.todos().iter().all(|t| t.title != "Forgotten"));
}

#[test]
fn repeated_edits_coalesce_into_one_write() {
    let kv = Arc::new(FlakyKv::default());
    let mut store = open_flaky_store(&kv);
    let writes_after_seed = kv.writes.load(Ordering::SeqCst);

    for _ in 0..5 {
        store.toggle_item_purchased("i1").unwrap();
    }
    assert_eq!(store.pending_writes(), vec![CollectionKey::Items]);
    assert!(store.flush_pending().is_clean());

    assert_eq!(kv.writes.load(Ordering::SeqCst), writes_after_seed + 1);
    assert!(store.item("i1").unwrap().is_purchased);
}

#[test]
fn failed_flush_is_reported_and_memory_stays_authoritative() {
    let kv = Arc::new(FlakyKv::default());
    let mut store = open_flaky_store(&kv);
    kv.fail_writes.store(true, Ordering::SeqCst);

    store.add_store("Trader Joe's", "🌻", "#DC2626").unwrap();
    let report = store.flush_pending();

    assert_eq!(report.failed, vec![CollectionKey::Stores]);
    assert!(!store.has_pending_writes());
    assert_eq!(store.stores().len(), 4);
}

#[test]
fn corrupt_collection_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("buydo.sqlite3");
    drop(open_at(&path));

    let kv = SqliteKvStore::open(&path).unwrap();
    kv.set_item("buydo_todos", "{not json").unwrap();
    kv.set_item("buydo_stores", "[]").unwrap();
    drop(kv);

    let store = open_at(&path);
    assert_eq!(store.todos().len(), 4);
    assert!(store.stores().is_empty());
    assert_eq!(store.items().len(), 6);
}
