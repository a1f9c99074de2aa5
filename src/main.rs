//! dircat CLI: scan, rescan, prune and search directory catalogs.

use anyhow::Result;
use clap::Parser;
use dircat::engine::arg_parser::Cli;
use dircat::engine::cli::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
