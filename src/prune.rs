//! Prune pass: drop catalog rows whose path is gone from disk.

use log::{debug, info};

use crate::engine::CatalogStore;
use crate::error::{CatalogError, Result};
use crate::utils::Colors;
use crate::PruneReport;

/// Remove every entry of `catalog_id` whose `full_path` no longer exists.
///
/// Fails with [`CatalogError::Unreachable`] (deleting nothing) when the catalog's root is not an
/// existing directory, e.g. an unmounted drive. Descendants of a removed directory fail the
/// existence check on their own, so no cascade is needed.
pub fn prune_catalog(store: &mut CatalogStore, catalog_id: i64) -> Result<PruneReport> {
    let catalog = store.get_catalog(catalog_id)?;
    if !catalog.original_path.is_dir() {
        return Err(CatalogError::Unreachable(catalog.original_path));
    }

    let entries = store.fetch_all(catalog_id)?;
    let checked = entries.len();
    // symlink_metadata: a dangling link is still an entry on disk.
    let removed: Vec<i64> = entries
        .iter()
        .filter(|e| std::fs::symlink_metadata(&e.full_path).is_err())
        .inspect(|e| debug!("Gone: {}", e.full_path.display()))
        .map(|e| e.id)
        .collect();

    let deleted = if removed.is_empty() {
        0
    } else {
        store.delete_entries(catalog_id, &removed)?
    };

    let report = PruneReport {
        catalog_id,
        checked,
        removed,
        deleted,
    };
    print_report(&catalog.name, &report);
    Ok(report)
}

fn print_report(name: &str, report: &PruneReport) {
    if report.deleted == 0 {
        debug!("{}: no stale entries ({} checked)", name, report.checked);
        return;
    }
    info!(
        "{}: {} | checked {}",
        name,
        Colors::colorize(Colors::REMOVED, &format!("Removed: {}", report.deleted)),
        report.checked
    );
}
