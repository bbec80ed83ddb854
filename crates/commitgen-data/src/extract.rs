//! History extraction
//!
//! Walks the commit history of a staged repository and writes one
//! `<hash>.msg` / `<hash>.diff` pair per commit into the processed
//! folder. The diff is the textual patch against the commit's first
//! parent; the root commit is diffed against the empty tree, so every
//! commit in the history yields a pair.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Commit, DiffFormat, DiffOptions, Oid, Repository, Sort};

use commitgen_core::DataDirs;

use crate::touch_marker;

/// Extraction statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessStats {
    pub processed: usize,
    pub errors: usize,
}

impl fmt::Display for ProcessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Commits: {} processed, {} errors",
            self.processed, self.errors
        )
    }
}

/// Processes the commits of the repository named (or located at) `repo`.
///
/// `repo` is either an absolute path or the name of a folder inside the
/// raw staging area. Output goes to the processed folder named after the
/// repository, followed by the completion marker. Per-commit failures
/// are logged and counted, not fatal.
pub fn process(dirs: &DataDirs, repo: &str) -> Result<ProcessStats> {
    let repo_path = if Path::new(repo).is_absolute() {
        PathBuf::from(repo)
    } else {
        dirs.raw_repo(repo)
    };
    let name = repo_path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .with_context(|| format!("Cannot derive a repo name from {:?}", repo_path))?;

    let dst = dirs.processed_repo(&name);
    fs::create_dir_all(&dst).with_context(|| format!("Failed to create {:?}", dst))?;

    let git = Repository::open(&repo_path)
        .with_context(|| format!("Failed to open repository at {:?}", repo_path))?;

    let mut revwalk = git.revwalk()?;
    revwalk.push_head().context("Failed to resolve HEAD")?;
    revwalk.set_sorting(Sort::TIME)?;

    let mut stats = ProcessStats::default();
    for oid_result in revwalk {
        let oid = oid_result.context("Failed to get commit OID")?;
        match write_commit_pair(&git, oid, &dst) {
            Ok(()) => stats.processed += 1,
            Err(e) => {
                log::warn!("Failed to process commit {}: {:?}", oid, e);
                stats.errors += 1;
            }
        }
    }

    touch_marker(&dirs.processed_marker(&name))?;
    log::info!("Processed {} into {:?}: {}", name, dst, stats);
    Ok(stats)
}

fn write_commit_pair(repo: &Repository, oid: Oid, dst: &Path) -> Result<()> {
    let commit = repo.find_commit(oid).context("Failed to find commit")?;

    let msg_path = dst.join(format!("{oid}.msg"));
    fs::write(&msg_path, commit.message_bytes())
        .with_context(|| format!("Failed to write {:?}", msg_path))?;

    let patch = commit_patch(repo, &commit)?;
    let diff_path = dst.join(format!("{oid}.diff"));
    fs::write(&diff_path, patch).with_context(|| format!("Failed to write {:?}", diff_path))?;

    Ok(())
}

/// Renders the textual patch a commit introduced relative to its first
/// parent (or the empty tree for the root commit).
fn commit_patch(repo: &Repository, commit: &Commit) -> Result<Vec<u8>> {
    let tree = commit.tree().context("Failed to get commit tree")?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let mut opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

    let mut buf = Vec::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => buf.push(line.origin() as u8),
            _ => {}
        }
        buf.extend_from_slice(line.content());
        true
    })?;
    Ok(buf)
}
