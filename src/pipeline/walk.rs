//! Pre-order walk loop: yields each path under the root, directory before its contents.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

use super::context::WalkFilter;

/// A path reached by the walk.
#[derive(Clone, Debug)]
pub struct WalkNode {
    pub path: PathBuf,
    pub is_dir: bool,
    /// File size in bytes; 0 for directories or when metadata is unreadable.
    pub size: u64,
}

/// One result from a directory walk: either a node to catalog or an error with optional path.
pub enum WalkOutcome {
    Ok(WalkNode),
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert a walkdir result into [`WalkOutcome`]. Paths that are not valid UTF-8 become
/// errors: they cannot be stored and read back unchanged.
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> WalkOutcome {
    match r {
        Ok(entry) if entry.path().to_str().is_none() => WalkOutcome::Err {
            msg: "path is not valid UTF-8".to_string(),
            path: Some(entry.into_path()),
        },
        Ok(entry) => {
            let is_dir = entry.file_type().is_dir();
            let size = if is_dir {
                0
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            };
            WalkOutcome::Ok(WalkNode {
                path: entry.into_path(),
                is_dir,
                size,
            })
        }
        Err(err) => WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

/// Serial walk of `filter.root`, sorted by file name, symlinks not followed. The root itself is
/// not yielded, and excluded directories are not descended into.
pub fn walkdir_iter(filter: &WalkFilter) -> impl Iterator<Item = WalkOutcome> + '_ {
    WalkDir::new(&filter.root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| filter.includes(e.path()))
        .map(to_outcome_walkdir)
}

/// What the walk loop saw besides the nodes it handed out.
#[derive(Debug, Default)]
pub struct WalkStats {
    pub visited: usize,
    /// (path or placeholder, error message)
    pub skipped: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}

/// Consume `iter`, calling `visit` for each node in walk order. `cancel` is checked before every
/// node; errors are recorded and skipped.
pub fn run_walk_loop<I, F>(iter: I, cancel: &AtomicBool, mut visit: F) -> WalkStats
where
    I: Iterator<Item = WalkOutcome>,
    F: FnMut(WalkNode),
{
    let mut stats = WalkStats::default();
    let mut last_path: Option<PathBuf> = None;
    for outcome in iter {
        if cancel.load(Ordering::Relaxed) {
            stats.cancelled = true;
            break;
        }
        match outcome {
            WalkOutcome::Ok(node) => {
                last_path = Some(node.path.clone());
                stats.visited += 1;
                visit(node);
            }
            WalkOutcome::Err { msg, path } => {
                let to_push = path.unwrap_or_else(|| {
                    PathBuf::from(format!(
                        "<no-path, last was {}>",
                        last_path
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| "<none>".to_string())
                    ))
                });
                stats.skipped.push((to_push, msg));
            }
        }
    }
    stats
}
