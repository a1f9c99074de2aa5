//! Database operations: schema, open/backup, catalog store.

mod connection;
mod store;

pub use connection::{backup_to_file, open_db, open_db_in_memory};
pub use store::CatalogStore;

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Schema for catalog and dir_entry tables.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS catalog (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    original_path TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS dir_entry (
    id INTEGER PRIMARY KEY,
    directory TEXT NOT NULL,
    full_path TEXT NOT NULL,
    name TEXT NOT NULL,
    filesize INTEGER NOT NULL DEFAULT 0,
    thumbnail BLOB,
    is_directory INTEGER NOT NULL,
    catalog_id INTEGER NOT NULL,
    parent_id INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_dir_entry_path ON dir_entry(catalog_id, full_path);
CREATE INDEX IF NOT EXISTS idx_dir_entry_parent ON dir_entry(parent_id, is_directory);
CREATE INDEX IF NOT EXISTS idx_dir_entry_name ON dir_entry(catalog_id, name);
"#;

/// Column list shared by every `SELECT` that maps into a DirEntry.
pub(crate) const DIR_ENTRY_COLUMNS: &str =
    "id, directory, full_path, name, filesize, thumbnail, is_directory, catalog_id, parent_id";

pub(crate) const INSERT_DIR_ENTRY_SQL: &str = "INSERT INTO dir_entry \
    (directory, full_path, name, filesize, thumbnail, is_directory, catalog_id, parent_id) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

pub(crate) const INSERT_CATALOG_SQL: &str =
    "INSERT INTO catalog (name, original_path, tags) VALUES (?1, ?2, ?3)";
