//! Store and shopping item mutations.

use super::{not_found, optional_text, required_text, ReactiveStore, StoreError, StoreResult};
use crate::kv::KvStore;
use crate::model::ids::new_entity_id;
use crate::model::shopping::{ItemPatch, ShoppingItem, Store};
use crate::repo::CollectionKey;
use log::info;

/// Input for a new shopping item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub quantity: Option<String>,
    pub notes: Option<String>,
}

impl NewItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// What `delete_store` removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDeletion {
    pub store: Option<Store>,
    pub removed_items: usize,
}

impl<K: KvStore> ReactiveStore<K> {
    pub fn store(&self, id: &str) -> Option<&Store> {
        self.stores.iter().find(|store| store.id == id)
    }

    pub fn item(&self, id: &str) -> Option<&ShoppingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All items of `store_id`, purchased or not.
    pub fn get_store_items(&self, store_id: &str) -> Vec<&ShoppingItem> {
        self.items
            .iter()
            .filter(|item| item.store_id == store_id)
            .collect()
    }

    /// Number of items of `store_id` still to buy.
    pub fn get_store_item_count(&self, store_id: &str) -> usize {
        self.items
            .iter()
            .filter(|item| item.store_id == store_id && !item.is_purchased)
            .count()
    }

    pub fn add_store(&mut self, name: &str, icon: &str, color: &str) -> StoreResult<Store> {
        let store = Store {
            id: new_entity_id(),
            name: required_text(name, "store name")?,
            icon: icon.to_string(),
            color: color.to_string(),
            created_at: self.now(),
        };
        self.stores.push(store.clone());
        self.persist(CollectionKey::Stores);
        Ok(store)
    }

    pub fn update_store(
        &mut self,
        id: &str,
        name: &str,
        icon: &str,
        color: &str,
    ) -> StoreResult<Store> {
        let name = required_text(name, "store name")?;
        let store = self
            .stores
            .iter_mut()
            .find(|store| store.id == id)
            .ok_or_else(|| not_found(CollectionKey::Stores, id))?;
        store.name = name;
        store.icon = icon.to_string();
        store.color = color.to_string();
        let updated = store.clone();
        self.persist(CollectionKey::Stores);
        Ok(updated)
    }

    /// Removes the store and, in the same call, every item that references it.
    ///
    /// Both collections are queued independently; the pair is not atomic on disk.
    pub fn delete_store(&mut self, id: &str) -> StoreDeletion {
        let position = self.stores.iter().position(|store| store.id == id);
        let store = position.map(|index| self.stores.remove(index));
        let before = self.items.len();
        self.items.retain(|item| item.store_id != id);
        let removed_items = before - self.items.len();

        if store.is_some() {
            self.persist(CollectionKey::Stores);
        }
        if removed_items > 0 {
            self.persist(CollectionKey::Items);
        }
        info!(
            "event=store_delete module=store status={} store_id={id} removed_items={removed_items}",
            if store.is_some() { "ok" } else { "skip" }
        );
        StoreDeletion {
            store,
            removed_items,
        }
    }

    pub fn add_item(&mut self, store_id: &str, input: NewItem) -> StoreResult<ShoppingItem> {
        let name = required_text(&input.name, "item name")?;
        if self.store(store_id).is_none() {
            return Err(StoreError::StoreNotFound(store_id.to_string()));
        }
        let item = ShoppingItem {
            id: new_entity_id(),
            store_id: store_id.to_string(),
            name,
            quantity: optional_text(input.quantity),
            notes: optional_text(input.notes),
            is_purchased: false,
            created_at: self.now(),
        };
        self.items.push(item.clone());
        self.persist(CollectionKey::Items);
        Ok(item)
    }

    /// Applies `patch` with the same trimming rules as [`Self::add_item`].
    pub fn update_item(&mut self, id: &str, patch: &ItemPatch) -> StoreResult<ShoppingItem> {
        let patch = ItemPatch {
            name: patch
                .name
                .as_deref()
                .map(|name| required_text(name, "item name"))
                .transpose()?,
            quantity: patch.quantity.clone().map(optional_text),
            notes: patch.notes.clone().map(optional_text),
            is_purchased: patch.is_purchased,
        };
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found(CollectionKey::Items, id))?;
        patch.apply_to(item);
        let updated = item.clone();
        self.persist(CollectionKey::Items);
        Ok(updated)
    }

    /// Flips `is_purchased`; returns the new value.
    pub fn toggle_item_purchased(&mut self, id: &str) -> StoreResult<bool> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found(CollectionKey::Items, id))?;
        item.is_purchased = !item.is_purchased;
        let purchased = item.is_purchased;
        self.persist(CollectionKey::Items);
        Ok(purchased)
    }

    pub fn delete_item(&mut self, id: &str) -> Option<ShoppingItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(index);
        self.persist(CollectionKey::Items);
        Some(removed)
    }
}
