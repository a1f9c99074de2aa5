//! Reporting for paths the walk could not catalog.

use std::path::PathBuf;

/// Log paths the walk could not read. Call after the walk loop.
pub fn report_skipped_paths(skipped: &[(PathBuf, String)]) {
    if skipped.is_empty() {
        return;
    }
    log::warn!(
        "Skipped {} paths (unreadable or not valid UTF-8)",
        skipped.len()
    );
    for (p, msg) in skipped {
        log::debug!("  skipped: {} ({})", p.display(), msg);
    }
}
