//! Catalog store: CRUD and query primitives over `catalog` and `dir_entry`.
//!
//! One [`CatalogStore`] owns one connection. Every thread that touches the catalog opens its
//! own store; stores are never shared between threads.

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter};
use std::path::{Path, PathBuf};

use crate::engine::search::{SearchPredicate, compile_search};
use crate::engine::tools::path_to_db_string;
use crate::error::{CatalogError, Result};
use crate::utils::config::DB_DELETE_BATCH_SIZE;
use crate::{Catalog, DirEntry, JoinMode, NewDirEntry, ROOT_PARENT_ID};

use super::{
    DIR_ENTRY_COLUMNS, INSERT_CATALOG_SQL, INSERT_DIR_ENTRY_SQL, backup_to_file, open_db,
    open_db_in_memory,
};

pub struct CatalogStore {
    conn: Connection,
}

fn row_to_dir_entry(row: &Row<'_>) -> rusqlite::Result<DirEntry> {
    let directory: String = row.get(1)?;
    let full_path: String = row.get(2)?;
    let filesize: i64 = row.get(4)?;
    let thumbnail: Option<Vec<u8>> = row.get(5)?;
    Ok(DirEntry {
        id: row.get(0)?,
        directory: PathBuf::from(directory),
        full_path: PathBuf::from(full_path),
        name: row.get(3)?,
        filesize: filesize.max(0) as u64,
        thumbnail: thumbnail.unwrap_or_default(),
        is_directory: row.get(6)?,
        catalog_id: row.get(7)?,
        parent_id: row.get(8)?,
    })
}

fn row_to_catalog(row: &Row<'_>) -> rusqlite::Result<Catalog> {
    let original_path: String = row.get(2)?;
    Ok(Catalog {
        id: row.get(0)?,
        name: row.get(1)?,
        original_path: PathBuf::from(original_path),
        tags: row.get(3)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl CatalogStore {
    /// Open (or create) the store file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    // ---- Catalogs ----

    /// Insert a catalog row and return its id. Names are unique.
    pub fn create_catalog(&self, name: &str, original_path: &Path, tags: &str) -> Result<i64> {
        match self.conn.execute(
            INSERT_CATALOG_SQL,
            params![name, path_to_db_string(original_path)?, tags],
        ) {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => {
                Err(CatalogError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All catalogs ordered by name.
    pub fn list_catalogs(&self) -> Result<Vec<Catalog>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, original_path, tags FROM catalog ORDER BY name")?;
        let rows = stmt.query_map([], row_to_catalog)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_catalog(&self, id: i64) -> Result<Catalog> {
        self.conn
            .query_row(
                "SELECT id, name, original_path, tags FROM catalog WHERE id = ?1",
                [id],
                row_to_catalog,
            )
            .optional()?
            .ok_or_else(|| CatalogError::NotFound(format!("catalog {id}")))
    }

    pub fn find_catalog(&self, name: &str) -> Result<Catalog> {
        self.conn
            .query_row(
                "SELECT id, name, original_path, tags FROM catalog WHERE name = ?1",
                [name],
                row_to_catalog,
            )
            .optional()?
            .ok_or_else(|| CatalogError::NotFound(format!("catalog '{name}'")))
    }

    // ---- Tree lookups ----

    /// Id of the directory entry at `dir_path` in the catalog.
    pub fn find_parent_id(&self, catalog_id: i64, dir_path: &Path) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM dir_entry WHERE catalog_id = ?1 AND full_path = ?2 AND is_directory = 1",
                params![catalog_id, path_to_db_string(dir_path)?],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| CatalogError::NotFound(format!("directory {}", dir_path.display())))
    }

    /// True if the catalog already has a row for `full_path`.
    pub fn entry_exists(&self, catalog_id: i64, full_path: &Path) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM dir_entry WHERE catalog_id = ?1 AND full_path = ?2",
                params![catalog_id, path_to_db_string(full_path)?],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Id of the catalog's synthetic root entry.
    pub fn get_root_id(&self, catalog_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM dir_entry WHERE catalog_id = ?1 AND parent_id = ?2 AND name = '' AND is_directory = 1",
                params![catalog_id, ROOT_PARENT_ID],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| CatalogError::NotFound(format!("root of catalog {catalog_id}")))
    }

    /// Insert a row unconditionally and return its id. Callers check [`Self::entry_exists`] first.
    pub fn create_dir_entry(&self, entry: &NewDirEntry) -> Result<i64> {
        let thumbnail = (!entry.thumbnail.is_empty()).then_some(entry.thumbnail.as_slice());
        self.conn.execute(
            INSERT_DIR_ENTRY_SQL,
            params![
                path_to_db_string(&entry.directory)?,
                path_to_db_string(&entry.full_path)?,
                entry.name,
                entry.filesize as i64,
                thumbnail,
                entry.is_directory,
                entry.catalog_id,
                entry.parent_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Root id for the catalog, inserting the synthetic root for `root_path` if it is missing.
    /// Returns `(root_id, created)`.
    pub fn ensure_root(&self, catalog_id: i64, root_path: &Path) -> Result<(i64, bool)> {
        match self.get_root_id(catalog_id) {
            Ok(id) => Ok((id, false)),
            Err(e) if e.is_not_found() => {
                let id = self.create_dir_entry(&NewDirEntry {
                    directory: root_path.parent().unwrap_or(root_path).to_path_buf(),
                    full_path: root_path.to_path_buf(),
                    name: String::new(),
                    filesize: 0,
                    thumbnail: Vec::new(),
                    is_directory: true,
                    catalog_id,
                    parent_id: ROOT_PARENT_ID,
                })?;
                Ok((id, true))
            }
            Err(e) => Err(e),
        }
    }

    // ---- Reads for the presentation layer ----

    /// Directory children of `parent_id`, ordered by id (insertion order).
    pub fn fetch_child_directories(&self, catalog_id: i64, parent_id: i64) -> Result<Vec<DirEntry>> {
        let sql = format!(
            "SELECT {DIR_ENTRY_COLUMNS} FROM dir_entry \
             WHERE catalog_id = ?1 AND is_directory = 1 AND parent_id = ?2 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![catalog_id, parent_id], row_to_dir_entry)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// File children of `parent_id`, ordered by name.
    pub fn fetch_files(&self, parent_id: i64) -> Result<Vec<DirEntry>> {
        let sql = format!(
            "SELECT {DIR_ENTRY_COLUMNS} FROM dir_entry \
             WHERE parent_id = ?1 AND is_directory = 0 ORDER BY name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([parent_id], row_to_dir_entry)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every entry of the catalog (root included), ordered by id.
    pub fn fetch_all(&self, catalog_id: i64) -> Result<Vec<DirEntry>> {
        let sql = format!("SELECT {DIR_ENTRY_COLUMNS} FROM dir_entry WHERE catalog_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([catalog_id], row_to_dir_entry)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_entry(&self, id: i64) -> Result<DirEntry> {
        let sql = format!("SELECT {DIR_ENTRY_COLUMNS} FROM dir_entry WHERE id = ?1");
        self.conn
            .query_row(&sql, [id], row_to_dir_entry)
            .optional()?
            .ok_or_else(|| CatalogError::NotFound(format!("entry {id}")))
    }

    pub fn count_entries(&self, catalog_id: i64) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM dir_entry WHERE catalog_id = ?1",
            [catalog_id],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as usize)
    }

    /// Entries of `scope` whose name matches `query` (see [`compile_search`]).
    pub fn search(&self, scope: i64, query: &str, mode: JoinMode) -> Result<Vec<DirEntry>> {
        self.search_with(&compile_search(scope, query, mode))
    }

    /// Run a compiled predicate. A predicate that matches nothing never reaches SQLite.
    pub fn search_with(&self, predicate: &SearchPredicate) -> Result<Vec<DirEntry>> {
        if predicate.matches_nothing() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {DIR_ENTRY_COLUMNS} FROM dir_entry WHERE {} ORDER BY id",
            predicate.where_clause()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(predicate.params()), row_to_dir_entry)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ---- Deletes ----

    /// Delete `ids` from the catalog in one transaction. Ids of other catalogs are left alone.
    /// Returns the number of rows deleted.
    pub fn delete_entries(&mut self, catalog_id: i64, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut deleted = 0_usize;
        for chunk in ids.chunks(DB_DELETE_BATCH_SIZE) {
            let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
            let sql = format!(
                "DELETE FROM dir_entry WHERE catalog_id = ? AND id IN ({})",
                placeholders.join(", ")
            );
            let params = std::iter::once(&catalog_id).chain(chunk.iter());
            deleted += tx.execute(&sql, params_from_iter(params))?;
        }
        tx.commit()?;
        Ok(deleted)
    }

    // ---- Whole store ----

    /// Copy the whole store to `path` (overwrites it).
    pub fn backup_to(&self, path: &Path) -> Result<()> {
        backup_to_file(&self.conn, path)
    }
}
