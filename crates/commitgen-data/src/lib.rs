//! Commitgen Data - Harvesting and encoding of commit history
//!
//! This crate is responsible for:
//! - Cloning repositories into the raw staging area
//! - Walking commit history into paired `<hash>.msg` / `<hash>.diff` files
//! - Encoding those byte pairs as one-hot tensors over a 128-symbol alphabet
//! - Splitting, streaming and batching the encoded samples for training

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};

pub mod acquire;
pub mod batch;
pub mod codec;
pub mod extract;
pub mod loader;

pub use batch::{format_batch, TrainingBatch};
pub use loader::SampleLimits;

/// Creates a completion marker file if it does not already exist
pub(crate) fn touch_marker(path: &Path) -> Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to create marker {:?}", path))?;
    Ok(())
}
