//! Clone command implementation

use std::path::Path;

use anyhow::Result;
use commitgen_core::DataDirs;
use commitgen_data::acquire;

/// Clones a repository into the raw staging area
pub fn cmd_clone(dirs: &DataDirs, repo: &str, dst: Option<&Path>) -> Result<()> {
    let target = acquire::clone(dirs, repo, dst)?;
    println!("Cloned into {}", target.display());
    Ok(())
}
