//! dircat: catalog a directory tree into SQLite, with thumbnails, incremental rescans, pruning and search.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod prune;
pub mod scan;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{CatalogStore, SearchPredicate, compile_search, generate_thumbnail};
pub use error::{CatalogError, Result};
pub use pipeline::{ScanHandle, Scanner};
pub use prune::prune_catalog;
