//! Dataset discovery, splitting and streaming
//!
//! Processed repositories are folders of immutable `<hash>.msg` /
//! `<hash>.diff` pairs. All functions here are pure reads of those files,
//! so the split is deterministic: same files on disk, same sorted
//! identifier list, same partition boundary.
//!
//! Known limitation: near-duplicate commits (the same change landing
//! twice, e.g. once as a regular commit and once as a merge) can fall on
//! different sides of the partition and leak information between training
//! and validation. This is accepted, not silently corrected.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use commitgen_core::Split;

use crate::codec;

/// Optional byte-length cutoffs applied to raw inputs before encoding.
///
/// `None` means "no limit - read the entire input".
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleLimits {
    pub max_diff_len: Option<usize>,
    pub max_msg_len: Option<usize>,
}

/// Lists the commit identifiers available in a processed repository.
///
/// Returns the lexicographically sorted stems that have both a `.msg`
/// and a `.diff` sibling. Stems missing one side are skipped with a
/// warning rather than failing the whole load.
pub fn discover(dir: &Path) -> Result<Vec<String>> {
    let mut msgs = BTreeSet::new();
    let mut diffs = BTreeSet::new();

    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list processed repo {:?}", dir))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read directory entry in {:?}", dir))?
            .path();
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        match path.extension().and_then(|s| s.to_str()) {
            Some("msg") => {
                msgs.insert(stem);
            }
            Some("diff") => {
                diffs.insert(stem);
            }
            _ => {}
        }
    }

    for stem in msgs.symmetric_difference(&diffs) {
        log::warn!("Skipping commit {stem}: missing .msg or .diff sibling");
    }

    Ok(msgs.intersection(&diffs).cloned().collect())
}

fn read_pair(dir: &Path, id: &str, limits: SampleLimits) -> Result<(Array2<f32>, Array2<f32>)> {
    let diff_path = dir.join(format!("{id}.diff"));
    let msg_path = dir.join(format!("{id}.msg"));
    let diff = fs::read(&diff_path).with_context(|| format!("Failed to read {:?}", diff_path))?;
    let msg = fs::read(&msg_path).with_context(|| format!("Failed to read {:?}", msg_path))?;
    Ok((
        codec::encode_diff(&diff, limits.max_diff_len),
        codec::encode_msg(&msg, limits.max_msg_len),
    ))
}

/// Materializes one side of the train/validation partition.
///
/// Returns the diff and message encodings of every commit in the
/// requested side, in discover order.
pub fn load(
    dir: &Path,
    train_fraction: f64,
    split: Split,
    limits: SampleLimits,
) -> Result<(Vec<Array2<f32>>, Vec<Array2<f32>>)> {
    let ids = discover(dir)?;
    let part = split.partition(&ids, train_fraction);

    let mut diffs = Vec::with_capacity(part.len());
    let mut msgs = Vec::with_capacity(part.len());
    for id in part {
        let (d, m) = read_pair(dir, id, limits)?;
        diffs.push(d);
        msgs.push(m);
    }
    Ok((diffs, msgs))
}

/// Infinite stream of training samples drawn uniformly at random, with
/// replacement, from the training partition only.
///
/// Each sampler owns its RNG; separately created streams share no cursor
/// state. Every pull is one file-pair read plus an encode.
pub struct TrainSampler {
    dir: PathBuf,
    ids: Vec<String>,
    limits: SampleLimits,
    rng: StdRng,
}

impl TrainSampler {
    /// Draws and encodes one random training sample
    pub fn sample(&mut self) -> Result<(Array2<f32>, Array2<f32>)> {
        let id = &self.ids[self.rng.gen_range(0..self.ids.len())];
        read_pair(&self.dir, id, self.limits)
    }
}

impl Iterator for TrainSampler {
    type Item = Result<(Array2<f32>, Array2<f32>)>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sample())
    }
}

/// Creates a [`TrainSampler`] over the training partition of `dir`.
///
/// Fails when the training partition is empty, since an infinite stream
/// over nothing cannot make progress.
pub fn stream_train(dir: &Path, train_fraction: f64, limits: SampleLimits) -> Result<TrainSampler> {
    let ids = discover(dir)?;
    let train = Split::Train.partition(&ids, train_fraction).to_vec();
    anyhow::ensure!(
        !train.is_empty(),
        "training partition of {:?} is empty (fraction {})",
        dir,
        train_fraction
    );
    Ok(TrainSampler {
        dir: dir.to_path_buf(),
        ids: train,
        limits,
        rng: StdRng::from_entropy(),
    })
}
