//! Repository acquisition
//!
//! Cloning delegates to the external `git` binary; the rest of the
//! pipeline only ever consumes the resulting directory layout, never the
//! clone mechanism itself. Acquisition is assumed to run once under
//! operator supervision, so failures are fatal and never retried.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use commitgen_core::{DataDirs, MARKER_EXT};

use crate::touch_marker;

/// Takes the human-ish part out of a git URL.
///
/// Works for both ssh and https forms:
/// `git@github.com:acme/widget.git` and `https://github.com/acme/widget`
/// both become `widget`.
pub fn humanify(url: &str) -> String {
    let url = url.strip_suffix(".git").unwrap_or(url);
    let url = url.rsplit(':').next().unwrap_or(url);
    let tail = url.rsplit('/').next().unwrap_or(url);
    tail.to_string()
}

/// Clones `url` into the raw staging area (or `dst`, resolved relative to
/// the project root) and drops the completion marker next to the clone.
pub fn clone(dirs: &DataDirs, url: &str, dst: Option<&Path>) -> Result<PathBuf> {
    let name = humanify(url);
    let (target, marker) = match dst {
        Some(d) => {
            let base = dirs.root().join(d);
            let marker = base.join(format!("{name}.{MARKER_EXT}"));
            (base.join(&name), marker)
        }
        None => (dirs.raw_repo(&name), dirs.raw_marker(&name)),
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create staging area {:?}", parent))?;
    }

    log::info!("Cloning {} into {:?}", url, target);
    let status = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(&target)
        .status()
        .context("Failed to run git clone")?;
    anyhow::ensure!(status.success(), "git clone of {} failed: {}", url, status);

    touch_marker(&marker)?;
    Ok(target)
}
