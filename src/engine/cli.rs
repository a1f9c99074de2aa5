//! CLI command handler: the host application around the catalog API.

use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use std::path::Path;

use crate::engine::CatalogStore;
use crate::engine::arg_parser::{Cli, Commands};
use crate::engine::tools::entry_name;
use crate::prune::prune_catalog;
use crate::scan::run_scan;
use crate::utils::{Settings, setup_logging};
use crate::{Catalog, CatalogRef, DirEntry, JoinMode, ScanOptions, Scanner};

/// Settings file, then environment, then flags.
fn setup_settings(cli: &Cli) -> Result<Settings> {
    // A bad settings file ends the run here; main reports it on stderr.
    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.verbose |= cli.verbose;
    if let Some(ref db) = cli.db {
        settings.db_path = db.clone();
    }
    setup_logging(settings.verbose);
    debug!("{:#?}", settings);
    Ok(settings)
}

/// Run the selected subcommand.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let settings = setup_settings(cli)?;
    let db_path = settings.db_path.as_path();

    match &cli.command {
        Commands::Scan {
            dir,
            name,
            tags,
            no_thumbnails,
            exclude,
        } => {
            let name = match name {
                Some(n) => n.clone(),
                None => default_catalog_name(dir)?,
            };
            let mut excludes = settings.exclude.clone();
            excludes.extend(exclude.iter().cloned());
            let opts = ScanOptions {
                with_thumbnails: settings.with_thumbnails && !no_thumbnails,
                exclude: excludes,
                ..ScanOptions::default()
            };
            let scanner = Scanner::new(db_path, opts);
            let target = CatalogRef::New {
                name,
                tags: tags.clone(),
            };
            run_scan(&scanner, dir, target, settings.verbose)?;
        }
        Commands::Rescan { catalog } => {
            let catalog = resolve_catalog(&open_store(db_path)?, catalog)?;
            let opts = ScanOptions {
                with_thumbnails: settings.with_thumbnails,
                exclude: settings.exclude.clone(),
                ..ScanOptions::default()
            };
            let scanner = Scanner::new(db_path, opts);
            run_scan(
                &scanner,
                &catalog.original_path,
                CatalogRef::Existing(catalog.id),
                settings.verbose,
            )?;
        }
        Commands::Prune { catalog } => {
            let mut store = open_store(db_path)?;
            let catalog = resolve_catalog(&store, catalog)?;
            let report = prune_catalog(&mut store, catalog.id)
                .with_context(|| format!("prune catalog '{}'", catalog.name))?;
            println!(
                "Checked {}, removed {}",
                report.checked,
                report.deleted.to_string().red()
            );
        }
        Commands::Catalogs => {
            let store = open_store(db_path)?;
            for c in store.list_catalogs()? {
                println!(
                    "{:>4}  {}  {}  {}",
                    c.id,
                    c.name.cyan(),
                    c.original_path.display(),
                    c.tags.dimmed()
                );
            }
        }
        Commands::Ls { catalog, dir } => {
            let store = open_store(db_path)?;
            let catalog = resolve_catalog(&store, catalog)?;
            let dir_id = match dir {
                Some(id) => *id,
                None => store.get_root_id(catalog.id)?,
            };
            for d in store.fetch_child_directories(catalog.id, dir_id)? {
                println!("{:>6}  {}/", d.id, d.name.blue().bold());
            }
            for f in store.fetch_files(dir_id)? {
                print_file_row(&f, false);
            }
        }
        Commands::Search {
            catalog,
            terms,
            any,
        } => {
            let store = open_store(db_path)?;
            let catalog = resolve_catalog(&store, catalog)?;
            let mode = if *any { JoinMode::Any } else { JoinMode::All };
            let hits = store.search(catalog.id, &terms.join(" "), mode)?;
            for e in &hits {
                print_file_row(e, true);
            }
            debug!("{} matches", hits.len());
        }
        Commands::Show { id, thumbnail_out } => {
            let store = open_store(db_path)?;
            let entry = store.get_entry(*id)?;
            println!("{}", entry.full_path.display());
            println!(
                "  {}  size {}  catalog {}  parent {}",
                if entry.is_directory { "dir " } else { "file" },
                human_size(entry.filesize),
                entry.catalog_id,
                entry.parent_id
            );
            println!("  thumbnail: {} bytes", entry.thumbnail.len());
            if let Some(out) = thumbnail_out {
                if !entry.has_thumbnail() {
                    anyhow::bail!("entry {} has no thumbnail", entry.id);
                }
                std::fs::write(out, &entry.thumbnail)
                    .with_context(|| format!("write thumbnail to {}", out.display()))?;
            }
        }
        Commands::Export { file } => {
            let store = open_store(db_path)?;
            store
                .backup_to(file)
                .with_context(|| format!("export store to {}", file.display()))?;
            println!("Exported to {}", file.display());
        }
    }
    Ok(())
}

fn open_store(db_path: &Path) -> Result<CatalogStore> {
    CatalogStore::open(db_path).with_context(|| format!("open store {}", db_path.display()))
}

/// Catalog by numeric id, else by name.
fn resolve_catalog(store: &CatalogStore, key: &str) -> Result<Catalog> {
    let found = match key.parse::<i64>() {
        Ok(id) => store.get_catalog(id).or_else(|_| store.find_catalog(key)),
        Err(_) => store.find_catalog(key),
    };
    found.with_context(|| format!("no catalog '{key}'"))
}

fn default_catalog_name(dir: &Path) -> Result<String> {
    let canonical = dir
        .canonicalize()
        .with_context(|| format!("resolve {}", dir.display()))?;
    let name = entry_name(&canonical);
    Ok(if name.is_empty() {
        canonical.display().to_string()
    } else {
        name
    })
}

fn print_file_row(e: &DirEntry, full: bool) {
    let label = if full {
        e.full_path.display().to_string()
    } else {
        e.name.clone()
    };
    let thumb = if e.has_thumbnail() { "[img]" } else { "" };
    println!(
        "{:>6}  {}  {:>10}  {}",
        e.id,
        label,
        human_size(e.filesize),
        thumb.green()
    );
}

/// Bytes with a binary unit suffix (e.g. `1.5 KiB`).
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
