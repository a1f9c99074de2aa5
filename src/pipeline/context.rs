//! Pass context: everything the scan worker owns for one pass, plus the walk filter.

use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use crate::engine::tools::should_include_in_walk;
use crate::{CatalogRef, NO_CATALOG, ScanEvent, ScanOptions};

/// Moved into the worker thread. The worker opens its own store from `db_path`.
pub struct ScanContext {
    /// Canonical scan root.
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub target: CatalogRef,
    pub opts: ScanOptions,
    pub cancel: Arc<AtomicBool>,
    pub events: Sender<ScanEvent>,
}

/// Decides which walked paths are cataloged (and descended into).
#[derive(Clone, Debug)]
pub struct WalkFilter {
    pub root: PathBuf,
    pub store_files: Vec<PathBuf>,
    pub exclude: Vec<String>,
}

impl WalkFilter {
    pub fn new(root: &Path, store_files: Vec<PathBuf>, exclude: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            store_files,
            exclude: exclude.to_vec(),
        }
    }

    pub fn includes(&self, path: &Path) -> bool {
        should_include_in_walk(path, &self.root, &self.store_files, &self.exclude)
    }
}

/// Session state shared between a [`Scanner`](super::Scanner) and its worker: the running
/// flag and the catalog being written. Cleared on [`SessionGuard::release`] or drop (panic).
pub struct SessionGuard {
    running: Arc<AtomicBool>,
    active_catalog: Arc<AtomicI64>,
}

impl SessionGuard {
    pub fn new(running: Arc<AtomicBool>, active_catalog: Arc<AtomicI64>) -> Self {
        Self {
            running,
            active_catalog,
        }
    }

    pub fn set_catalog(&self, catalog_id: i64) {
        self.active_catalog.store(catalog_id, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.active_catalog.store(NO_CATALOG, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.release();
    }
}
