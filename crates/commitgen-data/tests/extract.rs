//! Tests for history extraction
//!
//! These build a throwaway repository with git2 instead of cloning over
//! the network, then check the processed folder layout.

use std::fs;
use std::path::Path;

use anyhow::Result;
use git2::{Commit, Oid, Repository, Signature};
use tempfile::TempDir;

use commitgen_core::DataDirs;
use commitgen_data::extract::process;

fn commit_file(repo: &Repository, rel: &str, content: &str, msg: &str) -> Result<Oid> {
    let workdir = repo.workdir().expect("test repo has a workdir");
    fs::write(workdir.join(rel), content)?;

    let mut index = repo.index()?;
    index.add_path(Path::new(rel))?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let sig = Signature::now("Tester", "tester@example.com")?;
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };
    let parents: Vec<&Commit> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents)?;
    Ok(oid)
}

fn staged_repo(dirs: &DataDirs, name: &str) -> Result<(Repository, Oid, Oid)> {
    let repo_dir = dirs.raw_repo(name);
    fs::create_dir_all(&repo_dir)?;
    let repo = Repository::init(&repo_dir)?;
    let first = commit_file(&repo, "greeting.txt", "hello\n", "add greeting\n")?;
    let second = commit_file(&repo, "greeting.txt", "hello world\n", "extend greeting\n")?;
    Ok((repo, first, second))
}

#[test]
fn test_process_writes_pair_per_commit() -> Result<()> {
    let tmp = TempDir::new()?;
    let dirs = DataDirs::new(tmp.path());
    let (_repo, first, second) = staged_repo(&dirs, "sample")?;

    let stats = process(&dirs, "sample")?;
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.errors, 0);

    let dst = dirs.processed_repo("sample");
    for oid in [first, second] {
        assert!(dst.join(format!("{oid}.msg")).exists());
        assert!(dst.join(format!("{oid}.diff")).exists());
    }
    assert!(dirs.processed_marker("sample").exists());
    Ok(())
}

#[test]
fn test_messages_match_commits() -> Result<()> {
    let tmp = TempDir::new()?;
    let dirs = DataDirs::new(tmp.path());
    let (_repo, first, second) = staged_repo(&dirs, "sample")?;
    process(&dirs, "sample")?;

    let dst = dirs.processed_repo("sample");
    let first_msg = fs::read_to_string(dst.join(format!("{first}.msg")))?;
    let second_msg = fs::read_to_string(dst.join(format!("{second}.msg")))?;
    assert_eq!(first_msg, "add greeting\n");
    assert_eq!(second_msg, "extend greeting\n");
    Ok(())
}

#[test]
fn test_root_commit_diffs_against_empty_tree() -> Result<()> {
    let tmp = TempDir::new()?;
    let dirs = DataDirs::new(tmp.path());
    let (_repo, first, second) = staged_repo(&dirs, "sample")?;
    process(&dirs, "sample")?;

    let dst = dirs.processed_repo("sample");
    let root_diff = fs::read_to_string(dst.join(format!("{first}.diff")))?;
    assert!(root_diff.contains("+hello"), "root diff was: {root_diff}");

    let second_diff = fs::read_to_string(dst.join(format!("{second}.diff")))?;
    assert!(second_diff.contains("-hello"), "second diff was: {second_diff}");
    assert!(second_diff.contains("+hello world"));
    Ok(())
}

#[test]
fn test_process_accepts_absolute_path() -> Result<()> {
    let tmp = TempDir::new()?;
    let dirs = DataDirs::new(tmp.path());
    staged_repo(&dirs, "sample")?;

    let abs = dirs.raw_repo("sample");
    let stats = process(&dirs, abs.to_str().unwrap())?;
    assert_eq!(stats.processed, 2);
    Ok(())
}

#[test]
fn test_process_missing_repo_fails() {
    let tmp = TempDir::new().unwrap();
    let dirs = DataDirs::new(tmp.path());
    assert!(process(&dirs, "no-such-repo").is_err());
}
