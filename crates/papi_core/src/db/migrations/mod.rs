//! Payments schema migrations.
//!
//! # Responsibility
//! - Keep the embedded SQL migrations for the `payments` store.
//! - Bring a connection from its recorded schema version to the latest one.
//!
//! # Invariants
//! - `MIGRATIONS` is sorted by strictly increasing `version`.
//! - `PRAGMA user_version` equals the version of the last applied migration.
//! - A failed upgrade leaves both schema and `user_version` untouched.

use crate::db::{DbError, DbResult};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_payments.sql"),
}];

/// Schema version produced by the newest embedded migration.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Upgrades the connection's schema to [`latest_version`].
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the file was written by a
///   build that knows newer migrations.
/// - [`DbError::Sqlite`] when a statement fails; nothing is committed then.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let recorded = current_user_version(conn)?;
    let pending = pending_migrations(recorded)?;
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    pending
        .iter()
        .try_for_each(|migration| run_migration(&tx, migration))?;
    tx.commit()?;
    Ok(())
}

/// Reads the schema version stored in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Migrations newer than `recorded`, in application order.
fn pending_migrations(recorded: u32) -> DbResult<&'static [Migration]> {
    let latest_supported = latest_version();
    if recorded > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: recorded,
            latest_supported,
        });
    }

    let first_pending = MIGRATIONS.partition_point(|migration| migration.version <= recorded);
    Ok(&MIGRATIONS[first_pending..])
}

fn run_migration(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)?;
    Ok(())
}
