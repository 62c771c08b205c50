//! Domain services consumed by `ReactiveStore`.
//!
//! # Responsibility
//! - Keep side-effect collaborators (seeding, reminders, attachments) and
//!   pure helpers (note blocks, autosave) independent of store state.

pub mod attachment_service;
pub mod autosave;
pub mod note_blocks;
pub mod reminder_service;
pub mod seed_service;
