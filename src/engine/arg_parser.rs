use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Catalog directory trees into a searchable SQLite store, with image thumbnails.
#[derive(Clone, Parser)]
#[command(name = "dircat")]
#[command(about = "Catalog a directory tree; rescan, prune and search catalogs.")]
pub struct Cli {
    /// Catalog store file. Default: settings file, DIRCAT_DB, or ~/.dircat.sqlite.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Settings file. Default: ~/.dircat.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging and progress counter).
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Scan a directory into a new catalog.
    Scan {
        /// Directory to catalog.
        dir: PathBuf,
        /// Catalog name. Default: the directory's name.
        #[arg(long, short)]
        name: Option<String>,
        /// Free-form tags stored with the catalog.
        #[arg(long, short, default_value = "")]
        tags: String,
        /// Do not build image thumbnails.
        #[arg(long)]
        no_thumbnails: bool,
        /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2
        #[arg(long, short = 'e', num_args = 1..)]
        exclude: Vec<String>,
    },
    /// Add files that appeared under a catalog's root since the last scan.
    Rescan {
        /// Catalog name or id.
        catalog: String,
    },
    /// Remove entries whose files no longer exist.
    Prune {
        /// Catalog name or id.
        catalog: String,
    },
    /// List catalogs.
    Catalogs,
    /// List subdirectories and files of a directory entry (default: the catalog root).
    Ls {
        /// Catalog name or id.
        catalog: String,
        /// Directory entry id.
        #[arg(long)]
        dir: Option<i64>,
    },
    /// Search entry names in a catalog.
    Search {
        /// Catalog name or id.
        catalog: String,
        /// Search terms (substring, case-insensitive).
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
        /// Match entries containing any term (default: all terms).
        #[arg(long)]
        any: bool,
    },
    /// Show one entry.
    Show {
        /// Entry id.
        id: i64,
        /// Write the entry's JPEG thumbnail to this file.
        #[arg(long)]
        thumbnail_out: Option<PathBuf>,
    },
    /// Copy the whole store to another file.
    Export {
        /// Destination file (overwritten).
        file: PathBuf,
    },
}
