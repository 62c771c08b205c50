//! Domain records for the four local collections.
//!
//! # Responsibility
//! - Define the persisted shapes of stores, shopping items, tasks and notes.
//! - Keep JSON field naming compatible with the persisted record layout.
//!
//! # Invariants
//! - Every record carries a collection-unique string `id`.
//! - Records are value snapshots; mutation happens through `ReactiveStore`.

pub mod ids;
pub mod note;
pub mod shopping;
pub mod todo;
