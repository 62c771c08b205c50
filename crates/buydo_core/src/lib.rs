//! Core domain logic for Buydo.
//! The reactive store in this crate is the single source of truth for
//! shopping lists, tasks and notes during a session.

pub mod clock;
pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig, Platform};
pub use kv::{KvError, KvStore, MemoryKvStore, SqliteKvStore};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::note::{ImageBlock, Note, NoteBlock, TextBlock};
pub use model::shopping::{ItemPatch, ShoppingItem, Store};
pub use model::todo::{Priority, TodoDraft, TodoPatch, TodoTask};
pub use repo::write_behind::FlushReport;
pub use repo::{CollectionKey, StorageKeys};
pub use service::attachment_service::{AttachmentError, ImageSource, MediaPermission};
pub use service::reminder_service::{
    NotificationCenter, NotificationChannel, NotificationError, NotificationRequest,
    ReminderError, ScheduledReminder,
};
pub use service::seed_service::SeedOutcome;
pub use store::{
    Collaborators, NewItem, NoteDeletion, ReactiveStore, ReminderStatus, StoreDeletion,
    StoreError, StoreResult, TodoOutcome, ValidationError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
