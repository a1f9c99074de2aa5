//! Open and back up the catalog database.

use rusqlite::Connection;
use rusqlite::backup::Backup;
use std::path::Path;
use std::time::Duration;

use crate::Result;

use super::{SCHEMA, WAL_PRAGMAS};

/// Enable WAL and apply schema to an open connection (idempotent).
fn apply_wal_and_schema(conn: &Connection) -> Result<()> {
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    conn.execute_batch(WAL_PRAGMAS)?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Open or create the catalog DB and ensure schema + WAL.
pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    apply_wal_and_schema(&conn)?;
    log::debug!("Opened catalog store {}", path.display());
    Ok(conn)
}

/// Open an in-memory DB with the same schema (no WAL pragmas needed).
pub fn open_db_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Copy the source database to a file. Destination is overwritten.
pub fn backup_to_file(source: &Connection, path: &Path) -> Result<()> {
    let mut dest = Connection::open(path)?;
    {
        let backup = Backup::new(source, &mut dest)?;
        backup.run_to_completion(100, Duration::from_millis(0), None)?;
    }
    dest.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    dest.execute_batch(WAL_PRAGMAS)?;
    Ok(())
}
