//! SQLite bootstrap for the durable key-value backend.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by `SqliteKvStore`.
//! - Apply schema migrations before any record is read or written.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Why the record database could not be made ready.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused to open the file (or the private in-memory database).
    Connect {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// Busy timeout or `user_version` read failed on a fresh connection.
    Setup(rusqlite::Error),
    /// The file was written by a newer build; it is left untouched.
    SchemaTooNew { found: u32, supported: u32 },
    /// A schema step failed and the whole batch was rolled back.
    Migration {
        version: u32,
        step: &'static str,
        source: rusqlite::Error,
    },
}

impl DbError {
    /// `true` when the file needs a newer build rather than a repair.
    pub fn needs_newer_build(&self) -> bool {
        matches!(self, Self::SchemaTooNew { .. })
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect { mode, source } => {
                write!(f, "cannot open {mode} record database: {source}")
            }
            Self::Setup(err) => write!(f, "record database setup failed: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "record database schema v{found} was written by a newer build (this build reads up to v{supported})"
            ),
            Self::Migration {
                version,
                step,
                source,
            } => write!(f, "record schema step v{version} `{step}` failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Setup(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}
