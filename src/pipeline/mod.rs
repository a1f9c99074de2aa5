//! Scan pipeline: pass context, pre-order walk loop, background worker.

pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod walk;

pub use context::{ScanContext, SessionGuard, WalkFilter};
pub use error_handler::report_skipped_paths;
pub use orchestrator::{ScanHandle, Scanner};
pub use walk::{WalkNode, WalkOutcome, WalkStats, run_walk_loop, to_outcome_walkdir, walkdir_iter};
