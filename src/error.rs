//! Error kinds surfaced by the catalog store, passes and thumbnail pipeline.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Parent, root, entry or catalog lookup miss.
    #[error("not found: {0}")]
    NotFound(String),

    /// Catalog root (or scan root) does not resolve to an existing directory.
    #[error("path is not reachable: {}", .0.display())]
    Unreachable(PathBuf),

    /// Path that is not valid UTF-8 and so cannot be stored unchanged.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("cannot build thumbnail for {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("catalog name already in use: {0}")]
    DuplicateName(String),

    /// A scan pass is already running on this scanner.
    #[error("a scan is already running")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scan worker panicked")]
    WorkerPanicked,
}

impl CatalogError {
    /// True for the lookup-miss kind (lets callers fall back instead of failing).
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
