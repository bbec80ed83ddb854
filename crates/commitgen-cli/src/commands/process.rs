//! Process command implementation

use anyhow::Result;
use commitgen_core::DataDirs;
use commitgen_data::{acquire, extract};

/// Processes a staged repository into (message, diff) pairs.
///
/// A URL-ish argument (anything containing `:`) is reduced to its short
/// name first, so `process` composes with `clone` without retyping.
pub fn cmd_process(dirs: &DataDirs, repo: &str) -> Result<()> {
    let repo = if repo.contains(':') {
        acquire::humanify(repo)
    } else {
        repo.to_string()
    };

    let stats = extract::process(dirs, &repo)?;
    println!("{stats}");
    Ok(())
}
