//! Session-wide reactive store over the four collections.
//!
//! # Responsibility
//! - Hold the authoritative in-memory snapshot for a session.
//! - Apply every create/update/toggle/delete synchronously.
//! - Hand resulting snapshots to the write-behind queue.
//! - Drive reminder and attachment side effects and cascade deletes.
//!
//! # Invariants
//! - A read after a mutation observes that mutation.
//! - A rejected mutation leaves state and queue untouched.
//! - Persisted state converges to memory once pending writes are flushed,
//!   explicitly or when the store is dropped.
//! - No shopping item outlives its store in memory.

mod notes;
mod shopping;
mod todos;

pub use notes::NoteDeletion;
pub use shopping::{NewItem, StoreDeletion};
pub use todos::{ReminderStatus, TodoOutcome};

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::kv::KvStore;
use crate::model::note::Note;
use crate::model::shopping::{ShoppingItem, Store};
use crate::model::todo::TodoTask;
use crate::repo::entity_repo::EntityRepository;
use crate::repo::write_behind::{CollectionSnapshot, FlushReport, WriteBehindQueue};
use crate::repo::{CollectionKey, StorageKeys};
use crate::service::attachment_service::{
    AttachmentError, AttachmentManager, GrantedMediaAccess, MediaPermission,
};
use crate::service::note_blocks::{clamp_image_widths, normalize};
use crate::service::reminder_service::{
    DisabledNotifications, NotificationCenter, ReminderScheduler,
};
use crate::service::seed_service::{SeedData, SeedLoader, SeedOutcome};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Input rejected before any state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank after trimming.
    BlankField(&'static str),
    RemindWithoutDueDate,
    InvalidReminderTime(String),
    RemindersUnsupported,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::RemindWithoutDueDate => write!(f, "reminders need a due date"),
            Self::InvalidReminderTime(value) => {
                write!(f, "reminder time `{value}` must be 24h HH:MM")
            }
            Self::RemindersUnsupported => write!(f, "reminders are not supported on this platform"),
        }
    }
}

impl Error for ValidationError {}

#[derive(Debug)]
pub enum StoreError {
    NotFound {
        collection: CollectionKey,
        id: String,
    },
    /// A shopping item referenced a store that does not exist.
    StoreNotFound(String),
    Validation(ValidationError),
    Attachment(AttachmentError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "{} record not found: {id}", collection.as_str())
            }
            Self::StoreNotFound(id) => write!(f, "store not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Attachment(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Attachment(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AttachmentError> for StoreError {
    fn from(value: AttachmentError) -> Self {
        Self::Attachment(value)
    }
}

/// Platform primitives injected into the store.
pub struct Collaborators {
    pub notifications: Box<dyn NotificationCenter>,
    pub media_permission: Box<dyn MediaPermission>,
    pub clock: Box<dyn Clock>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            notifications: Box::new(DisabledNotifications),
            media_permission: Box::new(GrantedMediaAccess),
            clock: Box::new(SystemClock),
        }
    }
}

impl Collaborators {
    pub fn with_notifications(mut self, center: impl NotificationCenter + 'static) -> Self {
        self.notifications = Box::new(center);
        self
    }

    pub fn with_media_permission(mut self, permission: impl MediaPermission + 'static) -> Self {
        self.media_permission = Box::new(permission);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
}

/// Single source of truth for stores, items, tasks and notes.
pub struct ReactiveStore<K: KvStore> {
    config: CoreConfig,
    keys: StorageKeys,
    repo: EntityRepository<K>,
    queue: WriteBehindQueue,
    reminders: ReminderScheduler<Box<dyn NotificationCenter>>,
    attachments: AttachmentManager,
    clock: Box<dyn Clock>,
    seed_outcome: SeedOutcome,
    stores: Vec<Store>,
    items: Vec<ShoppingItem>,
    todos: Vec<TodoTask>,
    notes: Vec<Note>,
}

impl<K: KvStore> ReactiveStore<K> {
    /// Cold start: seeds on first run, then loads every collection once.
    ///
    /// Unreadable records fall back to the bundled defaults; nothing here fails.
    pub fn open(kv: K, collaborators: Collaborators, config: CoreConfig) -> Self {
        let Collaborators {
            notifications,
            media_permission,
            clock,
        } = collaborators;
        if let Err(err) = config.validate() {
            warn!("event=store_open module=store status=error reason=invalid_config error={err}");
        }
        let keys = config.storage_keys();
        let repo = EntityRepository::new(kv);
        let defaults = SeedData::defaults(clock.now());
        let seed_outcome = SeedLoader::new(&repo, &keys).ensure_seeded(&defaults);

        let stores = repo.load(&keys.collection(CollectionKey::Stores), defaults.stores);
        let items = repo.load(&keys.collection(CollectionKey::Items), defaults.items);
        let todos = repo.load(&keys.collection(CollectionKey::Todos), defaults.todos);
        let notes = repo
            .load(&keys.collection(CollectionKey::Notes), defaults.notes)
            .into_iter()
            .map(|note| {
                let mut note = normalize(note);
                clamp_image_widths(&mut note.blocks);
                note
            })
            .collect::<Vec<_>>();

        info!(
            "event=store_open module=store status=ok seed={:?} stores={} items={} todos={} notes={}",
            seed_outcome,
            stores.len(),
            items.len(),
            todos.len(),
            notes.len()
        );

        Self {
            reminders: ReminderScheduler::new(notifications, &config),
            attachments: AttachmentManager::new(&config, media_permission),
            config,
            keys,
            repo,
            queue: WriteBehindQueue::new(),
            clock,
            seed_outcome,
            stores,
            items,
            todos,
            notes,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// What seeding did during `open`.
    pub fn seed_outcome(&self) -> &SeedOutcome {
        &self.seed_outcome
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn todos(&self) -> &[TodoTask] {
        &self.todos
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn attachments(&self) -> &AttachmentManager {
        &self.attachments
    }

    /// Writes every pending snapshot to the key-value store.
    pub fn flush_pending(&mut self) -> FlushReport {
        self.queue.flush(&self.repo, &self.keys)
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending_writes(&self) -> Vec<CollectionKey> {
        self.queue.pending_keys()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Queues the current snapshot of `collection`.
    fn persist(&mut self, collection: CollectionKey) {
        let snapshot = match collection {
            CollectionKey::Stores => CollectionSnapshot::Stores(self.stores.clone()),
            CollectionKey::Items => CollectionSnapshot::Items(self.items.clone()),
            CollectionKey::Todos => CollectionSnapshot::Todos(self.todos.clone()),
            CollectionKey::Notes => CollectionSnapshot::Notes(self.notes.clone()),
        };
        self.queue.enqueue(snapshot);
    }
}

impl<K: KvStore> Drop for ReactiveStore<K> {
    /// Hands any still-pending snapshots to the key-value store.
    fn drop(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let report = self.flush_pending();
        if !report.is_clean() {
            error!(
                "event=store_close module=store status=error failed={:?}",
                report.failed
            );
        }
    }
}

fn required_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn not_found(collection: CollectionKey, id: &str) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}
