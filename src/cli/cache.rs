//! Cache command - inspect the repository cache

use crate::cli::context::{GlobalOptions, resolve_config};
use anstream::println;
use lapo::cache::entry_path;
use lapo::error::Result;

/// Print the deterministic working copy path for a repository URL
pub fn run_cache_path(options: &GlobalOptions, repo_url: &str) -> Result<()> {
    let config = resolve_config(options)?;
    let path = entry_path(&config.cache_dir, repo_url)?;
    println!("{}", path.display());
    Ok(())
}
