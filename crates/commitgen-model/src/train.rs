//! Training loop
//!
//! Drives the trainer graph against the streaming sampler, evaluates on
//! the validation partition after every epoch and checkpoints the weight
//! trio each time. A cancellation flag turns into a best-effort
//! "interrupted" checkpoint followed by error propagation; the most
//! recent completed step is never lost silently.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use commitgen_core::{DataDirs, Split};
use commitgen_data::loader::{self, TrainSampler};
use commitgen_data::{format_batch, SampleLimits};

use crate::optimizer::Adadelta;
use crate::seq2seq::{Seq2Seq, LATENT_DIM};
use crate::snapshot::SnapshotStore;

/// Raw-byte truncation applied to validation samples
const VAL_MAX_DIFF_LEN: usize = 400;
const VAL_MAX_MSG_LEN: usize = 200;

/// Knobs of one training run
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Fraction in [0, 1] of commits used for training vs. validation
    pub cv_split: f64,
    pub steps_per_epoch: usize,
    pub epochs: usize,
    pub batch_size: usize,
    /// Width in characters of the model summary printed before training
    /// (0 prints nothing)
    pub summary: usize,
    /// Materialize the training partition up front instead of re-reading
    /// files on every sample
    pub in_memory: bool,
    /// Raw-byte truncation applied to training samples
    pub max_diff_len: usize,
    pub max_msg_len: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            cv_split: 0.8,
            steps_per_epoch: 1000,
            epochs: 100,
            batch_size: 64,
            summary: 0,
            in_memory: false,
            max_diff_len: 200,
            max_msg_len: 200,
        }
    }
}

/// Outcome of a completed training run
#[derive(Debug, Clone)]
pub struct TrainStats {
    pub epochs_run: usize,
    pub steps_run: usize,
    pub final_train_loss: f32,
    pub snapshot_dir: PathBuf,
}

impl fmt::Display for TrainStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Epochs: {} | Steps: {} | Final loss: {:.4} | Snapshot: {:?}",
            self.epochs_run, self.steps_run, self.final_train_loss, self.snapshot_dir
        )
    }
}

/// Where training samples come from: the disk stream, or a materialized
/// pool sampled with replacement
enum SampleSource {
    Stream(TrainSampler),
    Memory {
        pool: Vec<(Array2<f32>, Array2<f32>)>,
        rng: StdRng,
    },
}

impl SampleSource {
    fn next_sample(&mut self) -> Result<(Array2<f32>, Array2<f32>)> {
        match self {
            SampleSource::Stream(sampler) => sampler.sample(),
            SampleSource::Memory { pool, rng } => {
                Ok(pool[rng.gen_range(0..pool.len())].clone())
            }
        }
    }
}

/// Trains a fresh model against the processed repository `repo`.
///
/// `cancel`, when set from the outside (e.g. a SIGINT handler), stops the
/// loop at the next step boundary after saving an "interrupted"
/// checkpoint, then the interruption propagates as an error.
pub fn train(
    dirs: &DataDirs,
    repo: &str,
    opts: &TrainOptions,
    cancel: Option<&AtomicBool>,
) -> Result<TrainStats> {
    let processed = dirs.processed_repo(repo);
    let limits = SampleLimits {
        max_diff_len: Some(opts.max_diff_len),
        max_msg_len: Some(opts.max_msg_len),
    };

    let mut model = Seq2Seq::new(LATENT_DIM);
    if opts.summary > 0 {
        println!("{}", model.summary(opts.summary));
    }
    let mut optimizer = Adadelta::new();

    // validation batch, formatted once (may be empty at cv_split = 1.0)
    let val_limits = SampleLimits {
        max_diff_len: Some(VAL_MAX_DIFF_LEN),
        max_msg_len: Some(VAL_MAX_MSG_LEN),
    };
    let (val_diffs, val_msgs) = loader::load(&processed, opts.cv_split, Split::Val, val_limits)
        .context("Failed to load validation partition")?;
    let val_batch = if val_diffs.is_empty() {
        None
    } else {
        let pairs: Vec<_> = val_diffs.into_iter().zip(val_msgs).collect();
        Some(format_batch(&pairs, VAL_MAX_DIFF_LEN, VAL_MAX_MSG_LEN))
    };

    let mut source = if opts.in_memory {
        let (diffs, msgs) = loader::load(&processed, opts.cv_split, Split::Train, limits)
            .context("Failed to materialize training partition")?;
        anyhow::ensure!(!diffs.is_empty(), "training partition of {:?} is empty", processed);
        log::info!("Materialized {} training samples in memory", diffs.len());
        SampleSource::Memory {
            pool: diffs.into_iter().zip(msgs).collect(),
            rng: StdRng::from_entropy(),
        }
    } else {
        SampleSource::Stream(loader::stream_train(&processed, opts.cv_split, limits)?)
    };

    let store = SnapshotStore::new(dirs);
    let snapshot = store.create(repo)?;
    log::info!("Saving snapshots to {:?}", snapshot.path());

    let mut steps_run = 0usize;
    let mut last_loss = f32::NAN;
    for epoch in 0..opts.epochs {
        let mut epoch_loss = 0.0f32;
        for step in 0..opts.steps_per_epoch {
            if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
                if let Err(e) = snapshot.save_epoch(&model, repo, "interrupted") {
                    log::warn!("Failed to save interrupt checkpoint: {:?}", e);
                }
                anyhow::bail!(
                    "training interrupted after {} steps; checkpoint saved to {:?}",
                    steps_run,
                    snapshot.path()
                );
            }

            let mut samples = Vec::with_capacity(opts.batch_size);
            for _ in 0..opts.batch_size {
                samples.push(source.next_sample()?);
            }
            let batch = format_batch(&samples, opts.max_diff_len, opts.max_msg_len);
            let loss = model.train_step(&batch, &mut optimizer);
            epoch_loss += loss;
            last_loss = loss;
            steps_run += 1;

            if (step + 1) % 100 == 0 {
                log::info!(
                    "Epoch {} | step {}/{} | loss {:.4}",
                    epoch,
                    step + 1,
                    opts.steps_per_epoch,
                    loss
                );
            }
        }

        let mean_loss = epoch_loss / opts.steps_per_epoch.max(1) as f32;
        match &val_batch {
            Some(batch) => {
                let val_loss = model.evaluate(batch);
                log::info!(
                    "Epoch {} done | train loss {:.4} | val loss {:.4}",
                    epoch,
                    mean_loss,
                    val_loss
                );
            }
            None => log::info!("Epoch {} done | train loss {:.4}", epoch, mean_loss),
        }

        snapshot.save_epoch(&model, repo, &format!("{epoch:03}"))?;
    }

    Ok(TrainStats {
        epochs_run: opts.epochs,
        steps_run,
        final_train_loss: last_loss,
        snapshot_dir: snapshot.path().to_path_buf(),
    })
}
