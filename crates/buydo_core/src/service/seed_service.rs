//! First-run default data.
//!
//! # Responsibility
//! - Write the default collections exactly once per installation.
//! - Provide the same defaults as load fallbacks.
//!
//! # Invariants
//! - The sentinel is written only after all four collections were written.
//! - An unreadable sentinel never triggers seeding, so existing data is not
//!   overwritten.
//! - Failures are logged and never propagated.

use crate::kv::KvStore;
use crate::model::note::Note;
use crate::model::shopping::{ShoppingItem, Store};
use crate::model::todo::{Priority, TodoTask};
use crate::repo::entity_repo::{EntityRepository, RepoResult};
use crate::repo::{CollectionKey, StorageKeys};
use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};

const SEEDED_VALUE: &str = "true";

/// Result of one `ensure_seeded` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Defaults and sentinel were written.
    Seeded,
    /// Sentinel already present; nothing written.
    AlreadySeeded,
    /// Some writes failed; the sentinel is absent so the next start retries.
    Partial { failed: Vec<String> },
    /// Sentinel could not be read; nothing written.
    Skipped,
}

/// Default records for all four collections.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedData {
    pub stores: Vec<Store>,
    pub items: Vec<ShoppingItem>,
    pub todos: Vec<TodoTask>,
    pub notes: Vec<Note>,
}

impl SeedData {
    /// The bundled defaults, timestamped at `now`.
    pub fn defaults(now: DateTime<Utc>) -> Self {
        let store = |id: &str, name: &str, icon: &str, color: &str| Store {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            created_at: now,
        };
        let item = |id: &str, store_id: &str, name: &str, quantity: Option<&str>, purchased| {
            ShoppingItem {
                id: id.to_string(),
                store_id: store_id.to_string(),
                name: name.to_string(),
                quantity: quantity.map(str::to_string),
                notes: None,
                is_purchased: purchased,
                created_at: now,
            }
        };
        let todo = |id: &str, title: &str, description: Option<&str>, priority| TodoTask {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            priority,
            due_date: None,
            is_completed: false,
            created_at: now,
            remind: false,
            reminder_time: None,
            notification_id: None,
            reminder_at: None,
        };
        let note = |id: &str, title: &str, content: &str| Note {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            blocks: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut registration = todo(
            "t2",
            "Renew car registration",
            Some("Due by end of month"),
            Priority::High,
        );
        registration.due_date = Some(now + Duration::days(7));

        Self {
            stores: vec![
                store("s1", "Costco", "🛒", "#1D4ED8"),
                store("s2", "Walmart", "🏪", "#EA580C"),
                store("s3", "Albertsons", "🍎", "#059669"),
            ],
            items: vec![
                item("i1", "s1", "Chicken Breast", Some("2 packs"), false),
                item("i2", "s1", "Paper Towels", Some("1"), false),
                item("i3", "s1", "Olive Oil", None, true),
                item("i4", "s2", "Toothpaste", Some("2"), false),
                item("i5", "s2", "Laundry Detergent", None, false),
                item("i6", "s3", "Bread", Some("1 loaf"), false),
            ],
            todos: vec![
                todo("t1", "Schedule dentist appointment", None, Priority::High),
                registration,
                todo("t3", "Clean garage", None, Priority::Medium),
                todo("t4", "Read new book", Some("Start with chapter 1"), Priority::Low),
            ],
            notes: vec![
                note(
                    "n1",
                    "WiFi Password",
                    "Home network: MyWiFi_5G\nPassword: securepass123",
                ),
                note(
                    "n2",
                    "Recipe: Pasta Carbonara",
                    "- 400g spaghetti\n- 200g pancetta\n- 4 egg yolks\n- 100g parmesan\n- Black pepper\n\n1. Cook pasta al dente\n2. Fry pancetta until crispy\n3. Mix eggs with parmesan\n4. Combine everything off heat",
                ),
            ],
        }
    }
}

/// Writes default data once, guarded by a sentinel key.
pub struct SeedLoader<'a, K: KvStore> {
    repo: &'a EntityRepository<K>,
    keys: &'a StorageKeys,
}

impl<'a, K: KvStore> SeedLoader<'a, K> {
    pub fn new(repo: &'a EntityRepository<K>, keys: &'a StorageKeys) -> Self {
        Self { repo, keys }
    }

    /// Whether the sentinel is present.
    pub fn is_seeded(&self) -> RepoResult<bool> {
        Ok(self.repo.kv().get_item(&self.keys.seeded())?.is_some())
    }

    /// Seeds `data` unless the sentinel says it already happened.
    pub fn ensure_seeded(&self, data: &SeedData) -> SeedOutcome {
        match self.is_seeded() {
            Ok(true) => return SeedOutcome::AlreadySeeded,
            Ok(false) => {}
            Err(err) => {
                warn!("event=seed module=seed status=skip reason=sentinel_unreadable error={err}");
                return SeedOutcome::Skipped;
            }
        }

        let writes = [
            (CollectionKey::Stores, self.write(CollectionKey::Stores, &data.stores)),
            (CollectionKey::Items, self.write(CollectionKey::Items, &data.items)),
            (CollectionKey::Todos, self.write(CollectionKey::Todos, &data.todos)),
            (CollectionKey::Notes, self.write(CollectionKey::Notes, &data.notes)),
        ];
        let mut failed: Vec<String> = writes
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(collection, _)| self.keys.collection(collection))
            .collect();

        if failed.is_empty() {
            let sentinel = self.keys.seeded();
            if let Err(err) = self.repo.kv().set_item(&sentinel, SEEDED_VALUE) {
                error!("event=seed module=seed status=error key={sentinel} error={err}");
                failed.push(sentinel);
            }
        }

        if failed.is_empty() {
            info!("event=seed module=seed status=ok");
            SeedOutcome::Seeded
        } else {
            error!(
                "event=seed module=seed status=error failed_keys={}",
                failed.join(",")
            );
            SeedOutcome::Partial { failed }
        }
    }

    fn write<T: serde::Serialize>(&self, collection: CollectionKey, records: &[T]) -> bool {
        let key = self.keys.collection(collection);
        match self.repo.try_save(&key, records) {
            Ok(()) => true,
            Err(err) => {
                error!("event=seed module=seed status=error key={key} error={err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SeedData;
    use chrono::Utc;

    #[test]
    fn defaults_reference_existing_stores() {
        let data = SeedData::defaults(Utc::now());
        for item in &data.items {
            assert!(data.stores.iter().any(|store| store.id == item.store_id));
        }
        assert_eq!(data.stores.len(), 3);
        assert_eq!(data.todos.len(), 4);
        assert!(data.notes.iter().all(|note| note.blocks.is_empty()));
    }
}
