//! Train command implementation

use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use commitgen_core::DataDirs;
use commitgen_model::{train, TrainOptions};

/// Trains the translator against a processed repository
#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    dirs: &DataDirs,
    repo: &str,
    cv_split: f64,
    summary: usize,
    steps_per_epoch: usize,
    epochs: usize,
    batch_size: usize,
    in_memory: bool,
    cancel: &AtomicBool,
) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&cv_split),
        "cv_split must be between 0 and 1, got {cv_split}"
    );

    let opts = TrainOptions {
        cv_split,
        summary,
        steps_per_epoch,
        epochs,
        batch_size,
        in_memory,
        ..TrainOptions::default()
    };

    log::info!("Training against {} with {:?}", repo, opts);
    let stats = train::train(dirs, repo, &opts, Some(cancel))
        .with_context(|| format!("Training against {repo} failed"))?;
    println!("{stats}");
    Ok(())
}
