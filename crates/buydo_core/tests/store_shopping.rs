mod common;

use buydo_core::{
    CollectionKey, Collaborators, ItemPatch, MemoryKvStore, NewItem, StoreError,
    ValidationError,
};
use common::open_memory_store;
use std::sync::Arc;

#[test]
fn costco_scenario_counts_toggles_and_cascades() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = open_memory_store(&kv, Collaborators::default());

    let costco = store.add_store("Costco", "🛒", "#1D4ED8").unwrap();
    let milk = store
        .add_item(
            &costco.id,
            NewItem {
                name: "Milk".to_string(),
                quantity: Some("2".to_string()),
                notes: None,
            },
        )
        .unwrap();
    assert_eq!(store.get_store_item_count(&costco.id), 1);

    assert!(store.toggle_item_purchased(&milk.id).unwrap());
    assert_eq!(store.get_store_item_count(&costco.id), 0);
    assert_eq!(store.get_store_items(&costco.id).len(), 1);

    let deletion = store.delete_store(&costco.id);
    assert_eq!(deletion.store.map(|s| s.name), Some("Costco".to_string()));
    assert_eq!(deletion.removed_items, 1);
    assert!(store.get_store_items(&costco.id).is_empty());
    assert!(store.item(&milk.id).is_none());
}

#[test]
fn deleting_seeded_store_removes_every_item_it_owned() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = open_memory_store(&kv, Collaborators::default());

    let deletion = store.delete_store("s1");

    assert_eq!(deletion.removed_items, 3);
    assert!(store.items().iter().all(|item| item.store_id != "s1"));
    assert_eq!(
        store.pending_writes(),
        vec![CollectionKey::Stores, CollectionKey::Items]
    );
}

#[test]
fn seeded_counts_exclude_purchased_items() {
    let kv = Arc::new(MemoryKvStore::new());
    let store = open_memory_store(&kv, Collaborators::default());

    assert_eq!(store.get_store_item_count("s1"), 2);
    assert_eq!(store.get_store_item_count("s2"), 2);
    assert_eq!(store.get_store_item_count("s3"), 1);
    assert_eq!(store.get_store_item_count("missing"), 0);
}

#[test]
fn item_for_unknown_store_is_rejected() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = open_memory_store(&kv, Collaborators::default());
    let items_before = store.items().len();

    let err = store.add_item("nope", NewItem::named("Eggs")).unwrap_err();

    assert!(matches!(err, StoreError::StoreNotFound(id) if id == "nope"));
    assert_eq!(store.items().len(), items_before);
    assert!(!store.has_pending_writes());
}

#[test]
fn blank_names_are_rejected_without_side_effects() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = open_memory_store(&kv, Collaborators::default());

    assert!(matches!(
        store.add_store("   ", "🛒", "#000000"),
        Err(StoreError::Validation(ValidationError::BlankField(_)))
    ));
    assert!(matches!(
        store.add_item("s1", NewItem::named("")),
        Err(StoreError::Validation(ValidationError::BlankField(_)))
    ));
    assert_eq!(store.stores().len(), 3);
    assert!(!store.has_pending_writes());
}

#[test]
fn item_patch_updates_and_clears_fields() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = open_memory_store(&kv, Collaborators::default());

    let updated = store
        .update_item(
            "i1",
            &ItemPatch {
                name: Some("Chicken Thighs".to_string()),
                quantity: Some(None),
                ..ItemPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Chicken Thighs");
    assert_eq!(updated.quantity, None);
    assert_eq!(store.item("i1"), Some(&updated));
}

#[test]
fn item_patch_is_trimmed_like_new_items() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = open_memory_store(&kv, Collaborators::default());

    let updated = store
        .update_item(
            "i1",
            &ItemPatch {
                name: Some("  Free-range Eggs  ".to_string()),
                quantity: Some(Some("   ".to_string())),
                notes: Some(Some(" large, brown ".to_string())),
                ..ItemPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Free-range Eggs");
    assert_eq!(updated.quantity, None);
    assert_eq!(updated.notes.as_deref(), Some("large, brown"));
    assert_eq!(store.item("i1"), Some(&updated));

    assert!(matches!(
        store.update_item(
            "i1",
            &ItemPatch {
                name: Some("   ".to_string()),
                ..ItemPatch::default()
            },
        ),
        Err(StoreError::Validation(ValidationError::BlankField("item name")))
    ));
    assert_eq!(store.item("i1").unwrap().name, "Free-range Eggs");
}

#[test]
fn unknown_ids_change_nothing() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut store = open_memory_store(&kv, Collaborators::default());

    assert!(matches!(
        store.toggle_item_purchased("ghost"),
        Err(StoreError::NotFound {
            collection: CollectionKey::Items,
            ..
        })
    ));
    assert!(store.delete_item("ghost").is_none());
    assert!(store.delete_store("ghost").store.is_none());
    assert!(!store.has_pending_writes());
}
