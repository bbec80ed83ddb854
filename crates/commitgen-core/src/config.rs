//! Filesystem layout configuration

use std::path::{Path, PathBuf};

/// Extension of the completion marker dropped next to a staged or
/// processed repository directory.
pub const MARKER_EXT: &str = "commitgen";

const RAW_REPOS: &str = "data/raw-repos";
const PROCESSED_REPOS: &str = "data/processed-repos";
const SAVED_MODELS: &str = "models/saved";

/// Fixed relative directory layout rooted at a project directory.
///
/// Every component receives this at construction; nothing in the
/// workspace reads ambient globals or environment variables for paths.
#[derive(Debug, Clone)]
pub struct DataDirs {
    root: PathBuf,
}

impl DataDirs {
    /// Creates a layout rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staging area for cloned repositories
    pub fn raw_repos(&self) -> PathBuf {
        self.root.join(RAW_REPOS)
    }

    /// Staged clone of a named repository
    pub fn raw_repo(&self, name: &str) -> PathBuf {
        self.raw_repos().join(name)
    }

    /// Completion marker for a staged clone
    pub fn raw_marker(&self, name: &str) -> PathBuf {
        self.raw_repos().join(format!("{name}.{MARKER_EXT}"))
    }

    /// Root of all processed `<hash>.msg` / `<hash>.diff` folders
    pub fn processed_repos(&self) -> PathBuf {
        self.root.join(PROCESSED_REPOS)
    }

    /// Processed folder of a named repository
    pub fn processed_repo(&self, name: &str) -> PathBuf {
        self.processed_repos().join(name)
    }

    /// Completion marker for a processed repository
    pub fn processed_marker(&self, name: &str) -> PathBuf {
        self.processed_repos().join(format!("{name}.{MARKER_EXT}"))
    }

    /// Root of all saved model snapshots
    pub fn saved_models(&self) -> PathBuf {
        self.root.join(SAVED_MODELS)
    }
}
