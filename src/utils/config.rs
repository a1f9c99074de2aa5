//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::path::PathBuf;
use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    db_filename: String,
    config_filename: String,
    db_env_var: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                db_filename: format!(".{pkg}.sqlite"),
                config_filename: format!(".{pkg}.toml"),
                db_env_var: format!("{}_DB", pkg.to_uppercase()),
            }
        })
    }

    /// Store file name (e.g. `.dircat.sqlite`).
    pub fn db_filename(&self) -> &str {
        &self.db_filename
    }

    /// Settings file name looked up in the home directory (e.g. `.dircat.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable overriding the store path (e.g. `DIRCAT_DB`).
    pub fn db_env_var(&self) -> &str {
        &self.db_env_var
    }

    /// Default store location: the store file in the user's home directory, or the
    /// current directory when no home is known.
    pub fn default_db_path(&self) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(self.db_filename())
    }

    pub fn default_config_path(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(self.config_filename()))
    }
}

// ---- Thumbnails ----

/// Thumbnail bounds and encoding.
pub struct ThumbnailConsts;

impl ThumbnailConsts {
    /// Longest side of a preview, in pixels (width and height bound).
    pub const MAX_DIM: u32 = 256;
    /// JPEG quality of the re-encoded preview.
    pub const JPEG_QUALITY: u8 = 85;
    /// Extensions (lowercase) that get a preview.
    pub const EXTENSIONS: [&'static str; 3] = ["jpg", "jpeg", "png"];
}

// ---- Database ----

/// Max ids bound per `DELETE ... IN (...)` statement (stays well under SQLite's variable limit).
pub const DB_DELETE_BATCH_SIZE: usize = 500;

// ---- Event channel ----

/// Default capacity of the scan worker's event channel.
pub const EVENT_CHANNEL_CAP: usize = 1024;
