//! Engine module: catalog store, thumbnails, search, host CLI plumbing

pub mod arg_parser;
pub mod cli;
pub mod db_ops;
pub mod progress;
pub mod search;
pub mod thumbnail;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::{Cli, Commands};
pub use db_ops::{CatalogStore, backup_to_file, open_db, open_db_in_memory};
pub use search::{SearchPredicate, compile_search, escape_like};
pub use thumbnail::{generate_thumbnail, try_generate_thumbnail};
pub use tools::{
    canonicalize_root, entry_name, glob_match, is_image_path, path_to_db_string,
    should_include_in_walk,
};
