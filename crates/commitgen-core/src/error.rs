//! Error types for commitgen-core

/// Errors shared across the workspace
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid split selector {0:?} (expected \"train\" or \"val\")")]
    InvalidSplit(String),

    #[error("no saved model snapshot matches {0:?}")]
    SnapshotNotFound(String),
}
