//! Schema steps for the key-value record database.
//!
//! # Invariants
//! - Step versions are strictly increasing.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - All pending steps run inside one transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "kv_records",
    sql: include_str!("0001_kv_records.sql"),
}];

/// Returns the newest schema version this build can open.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings the connection schema up to [`latest_version`].
///
/// # Errors
/// - `DbError::SchemaTooNew` when the file was written by a newer build.
/// - `DbError::Migration` naming the failing step; nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(DbError::Setup)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > found)
        .collect();
    let (Some(&first), Some(&last)) = (pending.first(), pending.last()) else {
        return Ok(());
    };

    let tx = conn.transaction().map_err(|source| step_failed(first, source))?;
    for step in &pending {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| step_failed(step, source))?;
    }
    tx.commit().map_err(|source| step_failed(last, source))?;

    for step in pending {
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            step.version, step.name
        );
    }
    Ok(())
}

fn step_failed(step: &SchemaStep, source: rusqlite::Error) -> DbError {
    DbError::Migration {
        version: step.version,
        step: step.name,
        source,
    }
}
