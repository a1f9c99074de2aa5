//! Progress display for the host: a counter fed from the scan event stream

use kdam::{Animation, Bar, BarExt};

use crate::ScanEvent;

/// Counter for unknown total (shows count without percentage).
pub fn create_counter(desc: &'static str, unit: &'static str) -> Bar {
    kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = unit
    )
}

/// Force a refresh of the bar (e.g. so the counter shows "0 dirs" immediately).
pub fn refresh_bar(bar: &mut Bar) {
    let _ = bar.refresh();
}

/// Advance the counter for directory events; `Finished` leaves it as is.
pub fn update_from_event(bar: &mut Bar, event: &ScanEvent) {
    if let ScanEvent::Directory(_) = event {
        let _ = bar.update(1);
    }
}
