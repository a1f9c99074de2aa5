//! Public types for the catalog API: stored rows, pass requests, events and reports.

use std::path::PathBuf;

use crate::utils::config::EVENT_CHANNEL_CAP;

/// `parent_id` of a catalog's synthetic root entry.
pub const ROOT_PARENT_ID: i64 = -1;

/// Scope value meaning "no catalog selected". Searches scoped to it match nothing.
pub const NO_CATALOG: i64 = -1;

/// One scanned root (a row in the `catalog` table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    pub id: i64,
    pub name: String,
    pub original_path: PathBuf,
    pub tags: String,
}

/// One file or directory row of a catalog's tree (adjacency list via `parent_id`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub id: i64,
    /// Absolute path of the containing directory.
    pub directory: PathBuf,
    /// Absolute path; unique within the catalog.
    pub full_path: PathBuf,
    /// Final path component. Empty for the synthetic root.
    pub name: String,
    /// Size in bytes (0 for directories).
    pub filesize: u64,
    /// JPEG preview, empty when absent.
    pub thumbnail: Vec<u8>,
    pub is_directory: bool,
    pub catalog_id: i64,
    /// Parent directory entry id, or [`ROOT_PARENT_ID`] for the synthetic root.
    pub parent_id: i64,
}

impl DirEntry {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID && self.name.is_empty() && self.is_directory
    }

    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail.is_empty()
    }
}

/// Fields for inserting a new [`DirEntry`]; the store assigns the id.
#[derive(Clone, Debug)]
pub struct NewDirEntry {
    pub directory: PathBuf,
    pub full_path: PathBuf,
    pub name: String,
    pub filesize: u64,
    pub thumbnail: Vec<u8>,
    pub is_directory: bool,
    pub catalog_id: i64,
    pub parent_id: i64,
}

/// Which catalog a scan pass writes into.
#[derive(Clone, Debug)]
pub enum CatalogRef {
    /// Create a new catalog with this name (and tags) for the scanned root.
    New { name: String, tags: String },
    /// Re-synchronize an existing catalog.
    Existing(i64),
}

impl CatalogRef {
    pub fn new_named(name: impl Into<String>) -> Self {
        CatalogRef::New {
            name: name.into(),
            tags: String::new(),
        }
    }
}

/// How search tokens are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinMode {
    /// Every token must match.
    #[default]
    All,
    /// At least one token must match.
    Any,
}

/// Options for a scan pass.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Generate JPEG previews for jpg/jpeg/png files.
    pub with_thumbnails: bool,
    /// Exclude patterns (glob syntax, matched against the file name or full path).
    pub exclude: Vec<String>,
    /// Capacity of the worker → consumer event channel.
    pub event_capacity: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            with_thumbnails: true,
            exclude: Vec::new(),
            event_capacity: EVENT_CHANNEL_CAP,
        }
    }
}

/// Progress events streamed from the scan worker, in emission order.
#[derive(Clone, Debug)]
pub enum ScanEvent {
    /// A directory was visited (emitted for new and already-cataloged directories).
    Directory(PathBuf),
    /// Terminal event; always the last one of a pass.
    Finished(ScanSummary),
}

/// Counters for one scan pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Catalog written to, or None when the pass ended before resolving it.
    pub catalog_id: Option<i64>,
    pub directories: usize,
    pub files: usize,
    /// Rows inserted (including a newly created synthetic root).
    pub inserted: usize,
    /// Nodes skipped because their path was already cataloged.
    pub existing: usize,
    /// Rows whose insert was rejected by the store.
    pub failed: usize,
    pub thumbnails: usize,
    /// Image files whose preview could not be built.
    pub thumbnail_failures: usize,
    /// Paths the walk could not read.
    pub skipped_paths: usize,
    pub cancelled: bool,
}

/// Outcome of a prune pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub catalog_id: i64,
    /// Entries whose path was tested.
    pub checked: usize,
    /// Ids whose path no longer exists.
    pub removed: Vec<i64>,
    /// Rows actually deleted by the store.
    pub deleted: usize,
}
