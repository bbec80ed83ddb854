//! Predict command implementation

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use commitgen_core::DataDirs;
use commitgen_model::{Predictor, SnapshotStore};

/// Reads a diff from stdin and prints the predicted commit message
pub fn cmd_predict(dirs: &DataDirs, selector: Option<&str>, max_len: usize) -> Result<()> {
    let store = SnapshotStore::new(dirs);
    let predictor = Predictor::from_store(&store, selector)?;

    let mut diff = Vec::new();
    io::stdin()
        .read_to_end(&mut diff)
        .context("Failed to read diff from stdin")?;

    let message = predictor.predict(&diff, max_len);
    let mut stdout = io::stdout().lock();
    stdout.write_all(&message)?;
    stdout.write_all(b"\n")?;
    Ok(())
}
