//! Host-side scan driver: start a pass, drain its events into a progress counter, honor Ctrl+C.

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;
use std::sync::atomic::Ordering;

use crate::engine::progress::{create_counter, refresh_bar, update_from_event};
use crate::utils::Colors;
use crate::{CatalogRef, ScanSummary, Scanner};

/// Run one pass to completion on the calling thread's behalf.
/// With `verbose`, directory events drive a terminal counter.
pub fn run_scan(
    scanner: &Scanner,
    root: &Path,
    target: CatalogRef,
    verbose: bool,
) -> Result<ScanSummary> {
    let cancel = scanner.cancel_flag();
    // Only one handler per process; a host that installed its own keeps it.
    if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
        debug!("Ctrl+C handler not installed: {}", e);
    }

    let handle = scanner
        .start(root, target)
        .with_context(|| format!("start scan of {}", root.display()))?;

    let mut bar = verbose.then(|| {
        let mut b = create_counter("Scanning", " dirs");
        refresh_bar(&mut b);
        b
    });
    let summary = handle
        .drain(|event| {
            if let Some(b) = bar.as_mut() {
                update_from_event(b, event);
            }
        })
        .context("scan pass")?;
    if bar.is_some() {
        eprintln!();
    }

    print_summary(&summary);
    if summary.cancelled {
        anyhow::bail!("Scan cancelled by user; entries found so far were kept");
    }
    Ok(summary)
}

fn print_summary(summary: &ScanSummary) {
    println!(
        "{} | {} | failed: {} | thumbnails: {}",
        Colors::colorize(Colors::ADDED, &format!("Added: {}", summary.inserted)),
        Colors::colorize(
            Colors::EXISTING,
            &format!("Already cataloged: {}", summary.existing)
        ),
        summary.failed,
        summary.thumbnails
    );
}
