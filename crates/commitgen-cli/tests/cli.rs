//! CLI integration tests
//!
//! These tests run the compiled `commitgen` binary directly, so they work
//! even though the helper functions live in private modules of the bin
//! crate.

use std::fs;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_commitgen"))
}

// ── help / version ────────────────────────────────────────────────────────────

#[test]
fn test_help_exits_zero() {
    let status = bin().arg("--help").status().expect("failed to run binary");
    assert!(status.success(), "--help should exit 0");
}

#[test]
fn test_version_flag() {
    let output = bin().arg("--version").output().expect("failed to run binary");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // clap emits "commitgen X.Y.Z"
    assert!(
        stdout.contains("commitgen"),
        "version output should contain binary name, got: {}",
        stdout
    );
}

// ── humanify ──────────────────────────────────────────────────────────────────

#[test]
fn test_humanify_ssh_url() {
    let output = bin()
        .arg("humanify")
        .arg("git@github.com:acme/widget-factory.git")
        .output()
        .expect("failed to run binary");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "widget-factory");
}

#[test]
fn test_humanify_https_url() {
    let output = bin()
        .arg("humanify")
        .arg("https://github.com/acme/widget-factory")
        .output()
        .expect("failed to run binary");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "widget-factory");
}

// ── predict without a trained model ───────────────────────────────────────────

#[test]
fn test_predict_without_snapshot_is_not_found() {
    let tmp = TempDir::new().unwrap();

    let output = bin()
        .arg("--data-root")
        .arg(tmp.path())
        .arg("predict")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run binary");

    assert!(!output.status.success(), "predict without a model should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no saved model snapshot"),
        "expected a not-found message, got: {}",
        stderr
    );
}

// ── stats ─────────────────────────────────────────────────────────────────────

#[test]
fn test_stats_on_processed_repo() {
    let tmp = TempDir::new().unwrap();
    let processed = tmp.path().join("data/processed-repos/sample");
    fs::create_dir_all(&processed).unwrap();
    fs::write(processed.join("aaa111.msg"), "add greeting\n").unwrap();
    fs::write(processed.join("aaa111.diff"), "+hello\n").unwrap();

    let output = bin()
        .arg("--data-root")
        .arg(tmp.path())
        .arg("stats")
        .arg("sample")
        .output()
        .expect("failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Commit pairs"), "got: {}", stdout);
    assert!(stdout.contains('1'), "got: {}", stdout);
}

#[test]
fn test_stats_on_missing_repo_fails() {
    let tmp = TempDir::new().unwrap();

    let status = bin()
        .arg("--data-root")
        .arg(tmp.path())
        .arg("stats")
        .arg("no-such-repo")
        .status()
        .expect("failed to run binary");

    assert!(!status.success());
}

// ── train argument validation ────────────────────────────────────────────────

#[test]
fn test_train_rejects_out_of_range_split() {
    let tmp = TempDir::new().unwrap();

    let output = bin()
        .arg("--data-root")
        .arg(tmp.path())
        .arg("train")
        .arg("sample")
        .arg("1.5")
        .output()
        .expect("failed to run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cv_split"), "got: {}", stderr);
}
