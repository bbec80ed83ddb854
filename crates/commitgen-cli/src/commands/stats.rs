//! Stats command implementation

use std::fs;

use anyhow::Result;
use colored::Colorize;
use commitgen_core::DataDirs;
use commitgen_data::loader;

/// Displays statistics for a processed repository
pub fn cmd_stats(dirs: &DataDirs, repo: &str) -> Result<()> {
    let dir = dirs.processed_repo(repo);
    let ids = loader::discover(&dir)?;

    let mut msg_bytes = 0u64;
    let mut diff_bytes = 0u64;
    for id in &ids {
        msg_bytes += fs::metadata(dir.join(format!("{id}.msg")))?.len();
        diff_bytes += fs::metadata(dir.join(format!("{id}.diff")))?.len();
    }

    println!("{}", "Processed Repository Statistics:".bright_cyan().bold());
    println!("  {}: {}", "Repository".bright_yellow(), repo.bold());
    println!(
        "  {}: {}",
        "Commit pairs".bright_yellow(),
        ids.len().to_string().bold()
    );
    println!(
        "  {}: {}",
        "Message bytes".bright_yellow(),
        msg_bytes.to_string().bold()
    );
    println!(
        "  {}: {}",
        "Diff bytes".bright_yellow(),
        diff_bytes.to_string().bold()
    );
    Ok(())
}
