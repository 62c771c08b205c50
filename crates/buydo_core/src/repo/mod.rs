//! Collection persistence on top of the key-value store.
//!
//! # Responsibility
//! - Map the four collections to their storage keys.
//! - Load/save whole typed collections (`EntityRepository`).
//! - Coalesce write-behind persistence jobs (`WriteBehindQueue`).
//!
//! # Invariants
//! - Each collection lives under exactly one key as one JSON array.
//! - Read failures never reach callers of `EntityRepository::load`.

pub mod entity_repo;
pub mod write_behind;

/// The persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionKey {
    Stores,
    Items,
    Todos,
    Notes,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 4] = [Self::Stores, Self::Items, Self::Todos, Self::Notes];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stores => "stores",
            Self::Items => "items",
            Self::Todos => "todos",
            Self::Notes => "notes",
        }
    }
}

/// Resolves collection keys and the seeding sentinel under a common prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Storage key holding `collection`, e.g. `buydo_stores`.
    pub fn collection(&self, collection: CollectionKey) -> String {
        format!("{}{}", self.prefix, collection.as_str())
    }

    /// Storage key of the first-run sentinel, e.g. `buydo_seeded`.
    pub fn seeded(&self) -> String {
        format!("{}seeded", self.prefix)
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_STORAGE_KEY_PREFIX)
    }
}
