//! Path and filter utilities

use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::utils::config::ThumbnailConsts;

/// Path as stored in the `dir_entry` / `catalog` text columns, byte for byte.
/// Paths that are not valid UTF-8 cannot be stored without changing them and are rejected.
pub fn path_to_db_string(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| CatalogError::NonUtf8Path(path.to_path_buf()))
}

/// Final component as a display name; empty when the path has none (e.g. `/`).
pub fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// True if the extension is one we build previews for (case-insensitive).
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            ThumbnailConsts::EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Canonicalize a scan/prune root. Anything that is not an existing directory is `Unreachable`.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .map_err(|_| CatalogError::Unreachable(path.to_path_buf()))?;
    if !canonical.is_dir() {
        return Err(CatalogError::Unreachable(path.to_path_buf()));
    }
    path_to_db_string(&canonical)?;
    Ok(canonical)
}

/// The store file plus its WAL/SHM siblings; never cataloged even when they live under the root.
pub fn store_file_set(db_path: &Path) -> Vec<PathBuf> {
    let Some(db) = db_path.canonicalize().ok() else {
        return Vec::new();
    };
    let name = db
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = db.parent().map(Path::to_path_buf).unwrap_or_default();
    vec![
        parent.join(format!("{name}-wal")),
        parent.join(format!("{name}-shm")),
        parent.join(format!("{name}-journal")),
        db,
    ]
}

/// Returns true if the path should be cataloged (not the root itself, not a store file, not excluded).
pub fn should_include_in_walk(
    path: &Path,
    root: &Path,
    store_files: &[PathBuf],
    exclude_patterns: &[String],
) -> bool {
    if path == root {
        return false;
    }
    if store_files.iter().any(|f| f == path) {
        return false;
    }
    if exclude_patterns.is_empty() {
        return true;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return true,
    };
    let path_str = path.to_string_lossy();
    !exclude_patterns
        .iter()
        .any(|pattern| glob_match(pattern, name) || glob_match(pattern, &path_str))
}

/// Glob matching with `*` (any run) and `?` (one char). A leading `!` is ignored.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.strip_prefix('!').unwrap_or(pattern).chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0_usize, 0_usize);
    // Last `*` seen and the text position it is currently absorbing up to.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}
