//! Scan orchestration: one background worker per pass, owning its own store handle and
//! streaming [`ScanEvent`]s back to the caller.

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::thread::{self, JoinHandle};

use crate::engine::CatalogStore;
use crate::engine::thumbnail::try_generate_thumbnail;
use crate::engine::tools::{canonicalize_root, entry_name, is_image_path, store_file_set};
use crate::error::{CatalogError, Result};
use crate::{Catalog, CatalogRef, NO_CATALOG, NewDirEntry, ScanEvent, ScanOptions, ScanSummary};

use super::context::{ScanContext, SessionGuard, WalkFilter};
use super::error_handler::report_skipped_paths;
use super::walk::{WalkNode, run_walk_loop, walkdir_iter};

/// Starts scan/rescan passes against the store at `db_path`, at most one at a time.
pub struct Scanner {
    db_path: PathBuf,
    opts: ScanOptions,
    running: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    active_catalog: Arc<AtomicI64>,
}

/// Caller's side of a running pass: the event stream and the worker.
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    worker: JoinHandle<Result<ScanSummary>>,
    cancel: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(db_path: impl Into<PathBuf>, opts: ScanOptions) -> Self {
        Self {
            db_path: db_path.into(),
            opts,
            running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            active_catalog: Arc::new(AtomicI64::new(NO_CATALOG)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Catalog the active pass writes to, once resolved.
    pub fn active_catalog(&self) -> Option<i64> {
        let id = self.active_catalog.load(Ordering::SeqCst);
        (id != NO_CATALOG).then_some(id)
    }

    /// Ask the active pass to stop at the next visited node.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Shared cancel flag (e.g. for a Ctrl+C handler).
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Start a pass over `root` into `target`.
    ///
    /// Rejected with [`CatalogError::Busy`] while another pass runs, and with
    /// [`CatalogError::Unreachable`] if `root` is not an existing directory, and with
    /// [`CatalogError::NonUtf8Path`] if its canonical path is not UTF-8. None of these write anything.
    pub fn start(&self, root: &Path, target: CatalogRef) -> Result<ScanHandle> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CatalogError::Busy);
        }
        let guard = SessionGuard::new(
            Arc::clone(&self.running),
            Arc::clone(&self.active_catalog),
        );
        // Dropping the guard on this early return clears the running flag again.
        let root = canonicalize_root(root)?;

        self.cancel.store(false, Ordering::SeqCst);
        let (event_tx, event_rx) = bounded::<ScanEvent>(self.opts.event_capacity.max(1));
        let ctx = ScanContext {
            root,
            db_path: self.db_path.clone(),
            target,
            opts: self.opts.clone(),
            cancel: Arc::clone(&self.cancel),
            events: event_tx,
        };
        debug!("Starting scan of {}", ctx.root.display());
        let worker = thread::spawn(move || run_pass(ctx, guard));
        Ok(ScanHandle {
            events: event_rx,
            worker,
            cancel: Arc::clone(&self.cancel),
        })
    }

    /// Rescan an existing catalog from its stored root.
    pub fn start_rescan(&self, catalog: &Catalog) -> Result<ScanHandle> {
        self.start(&catalog.original_path, CatalogRef::Existing(catalog.id))
    }
}

impl ScanHandle {
    /// Event stream: directory events, then one `Finished`.
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Pass every event to `on_event` until the stream closes, then join the worker.
    pub fn drain<F>(self, mut on_event: F) -> Result<ScanSummary>
    where
        F: FnMut(&ScanEvent),
    {
        for event in self.events.iter() {
            on_event(&event);
        }
        self.worker
            .join()
            .map_err(|_| CatalogError::WorkerPanicked)?
    }

    /// Discard remaining events and join the worker.
    pub fn wait(self) -> Result<ScanSummary> {
        self.drain(|_| {})
    }
}

/// Worker body: run the pass, clear session state, then send the terminal event.
fn run_pass(ctx: ScanContext, guard: SessionGuard) -> Result<ScanSummary> {
    let mut summary = ScanSummary::default();
    let result = scan_into_catalog(&ctx, &guard, &mut summary);
    if let Err(ref e) = result {
        warn!("Scan of {} stopped: {}", ctx.root.display(), e);
    }
    guard.release();
    // A consumer that dropped the stream does not stop or fail the pass.
    let _ = ctx.events.send(ScanEvent::Finished(summary.clone()));
    result.map(|()| summary)
}

fn scan_into_catalog(
    ctx: &ScanContext,
    guard: &SessionGuard,
    summary: &mut ScanSummary,
) -> Result<()> {
    let store = CatalogStore::open(&ctx.db_path)?;
    let catalog_id = match &ctx.target {
        CatalogRef::New { name, tags } => store.create_catalog(name, &ctx.root, tags)?,
        CatalogRef::Existing(id) => store.get_catalog(*id)?.id,
    };
    guard.set_catalog(catalog_id);
    summary.catalog_id = Some(catalog_id);

    let (root_id, created) = store.ensure_root(catalog_id, &ctx.root)?;
    if created {
        summary.inserted += 1;
    }
    summary.directories += 1;
    let _ = ctx.events.send(ScanEvent::Directory(ctx.root.clone()));

    let filter = WalkFilter::new(&ctx.root, store_file_set(&ctx.db_path), &ctx.opts.exclude);
    let mut pass = PassState {
        store: &store,
        events: &ctx.events,
        catalog_id,
        root_id,
        root: &ctx.root,
        with_thumbnails: ctx.opts.with_thumbnails,
        summary: &mut *summary,
    };
    let stats = run_walk_loop(walkdir_iter(&filter), &ctx.cancel, |node| pass.visit(node));

    summary.skipped_paths = stats.skipped.len();
    summary.cancelled = stats.cancelled;
    report_skipped_paths(&stats.skipped);
    if stats.cancelled {
        info!("Scan cancelled after {} paths", stats.visited);
    }
    info!(
        "Catalog {}: {} new, {} already present, {} failed ({} dirs, {} files)",
        catalog_id,
        summary.inserted,
        summary.existing,
        summary.failed,
        summary.directories,
        summary.files
    );
    Ok(())
}

/// Per-pass state borrowed by the visit callback.
struct PassState<'a> {
    store: &'a CatalogStore,
    events: &'a Sender<ScanEvent>,
    catalog_id: i64,
    root_id: i64,
    root: &'a Path,
    with_thumbnails: bool,
    summary: &'a mut ScanSummary,
}

impl PassState<'_> {
    /// Catalog one node. Store failures are logged and the node skipped.
    fn visit(&mut self, node: WalkNode) {
        if node.is_dir {
            self.summary.directories += 1;
            let _ = self.events.send(ScanEvent::Directory(node.path.clone()));
        } else {
            self.summary.files += 1;
        }

        match self.store.entry_exists(self.catalog_id, &node.path) {
            Ok(true) => {
                self.summary.existing += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Existence check failed for {}: {}", node.path.display(), e);
                self.summary.failed += 1;
                return;
            }
        }

        let directory = node.path.parent().unwrap_or(self.root);
        let parent_id = self.resolve_parent(directory);
        let thumbnail = if !node.is_dir && self.with_thumbnails {
            self.thumbnail_for(&node.path)
        } else {
            Vec::new()
        };

        let entry = NewDirEntry {
            directory: directory.to_path_buf(),
            full_path: node.path.clone(),
            name: entry_name(&node.path),
            filesize: if node.is_dir { 0 } else { node.size },
            thumbnail,
            is_directory: node.is_dir,
            catalog_id: self.catalog_id,
            parent_id,
        };
        match self.store.create_dir_entry(&entry) {
            Ok(_) => self.summary.inserted += 1,
            Err(e) => {
                warn!("Insert failed for {}: {}", node.path.display(), e);
                self.summary.failed += 1;
            }
        }
    }

    /// Parent directory id; falls back to the catalog root when the parent is not cataloged.
    fn resolve_parent(&self, directory: &Path) -> i64 {
        match self.store.find_parent_id(self.catalog_id, directory) {
            Ok(id) => id,
            Err(e) => {
                if !e.is_not_found() {
                    warn!("Parent lookup failed for {}: {}", directory.display(), e);
                }
                debug!("Parent {} not cataloged; using root", directory.display());
                self.root_id
            }
        }
    }

    fn thumbnail_for(&mut self, path: &Path) -> Vec<u8> {
        if !is_image_path(path) {
            return Vec::new();
        }
        match try_generate_thumbnail(path) {
            Ok(blob) => {
                if !blob.is_empty() {
                    self.summary.thumbnails += 1;
                }
                blob
            }
            Err(e) => {
                debug!("{}", e);
                self.summary.thumbnail_failures += 1;
                Vec::new()
            }
        }
    }
}
