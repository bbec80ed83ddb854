//! Weight snapshot persistence
//!
//! Each training run owns a directory under `models/saved` named
//! `<timestamp>_<repo>`, so the lexicographically greatest name is the
//! most recent run. Every epoch writes three numbered bincode blobs
//! (trainer, encoder, decoder) and re-points the `latest.json` record at
//! them; the record replaces filesystem symlinks for portability.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use commitgen_core::{CoreError, DataDirs};

use crate::gru::GruCell;
use crate::seq2seq::{Dense, Seq2Seq};

/// Timestamp format used in snapshot directory names
pub const SAVE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const LATEST_RECORD: &str = "latest.json";

/// Decoder weights persisted as one blob
#[derive(Serialize, Deserialize)]
struct DecoderWeights {
    gru: GruCell,
    head: Dense,
}

/// Record naming the current blob trio of a snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct LatestRecord {
    pub trainer: String,
    pub encoder: String,
    pub decoder: String,
    pub repo: String,
    pub created: String,
}

/// All snapshots below `models/saved`
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dirs: &DataDirs) -> Self {
        Self {
            dir: dirs.saved_models(),
        }
    }

    /// Starts a new timestamped snapshot directory for a training run
    pub fn create(&self, repo: &str) -> Result<Snapshot> {
        let stamp = Local::now().format(SAVE_TIME_FORMAT);
        let dir = self.dir.join(format!("{stamp}_{repo}"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot directory {:?}", dir))?;
        Ok(Snapshot { dir })
    }

    /// Resolves the most recent snapshot, optionally restricted to
    /// directory names ending in `selector` (a leading `*` is accepted
    /// and ignored). "Most recent" is the lexicographic maximum.
    pub fn latest(&self, selector: Option<&str>) -> Result<Snapshot> {
        let suffix = selector.map(|s| s.trim_start_matches('*').to_string());

        let mut best: Option<String> = None;
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                if !entry.path().is_dir() {
                    continue;
                }
                let name = match entry.file_name().into_string() {
                    Ok(n) => n,
                    Err(_) => continue,
                };
                if let Some(sfx) = &suffix {
                    if !name.ends_with(sfx.as_str()) {
                        continue;
                    }
                }
                if best.as_ref().map_or(true, |b| name > *b) {
                    best = Some(name);
                }
            }
        }

        match best {
            Some(name) => Ok(Snapshot {
                dir: self.dir.join(name),
            }),
            None => {
                Err(CoreError::SnapshotNotFound(selector.unwrap_or("latest").to_string()).into())
            }
        }
    }
}

/// One training run's snapshot directory
pub struct Snapshot {
    dir: PathBuf,
}

impl Snapshot {
    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        self.dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Writes the blob trio for `tag` (an epoch number or "interrupted")
    /// and re-points `latest.json` at it
    pub fn save_epoch(&self, model: &Seq2Seq, repo: &str, tag: &str) -> Result<()> {
        let trainer = format!("trainer-{tag}.bin");
        let encoder = format!("encoder-{tag}.bin");
        let decoder = format!("decoder-{tag}.bin");

        write_blob(&self.dir.join(&trainer), model)?;
        write_blob(&self.dir.join(&encoder), &model.encoder)?;
        let decoder_weights = DecoderWeights {
            gru: model.decoder.clone(),
            head: model.head.clone(),
        };
        write_blob(&self.dir.join(&decoder), &decoder_weights)?;

        let record = LatestRecord {
            trainer,
            encoder,
            decoder,
            repo: repo.to_string(),
            created: Local::now().format(SAVE_TIME_FORMAT).to_string(),
        };
        let record_path = self.dir.join(LATEST_RECORD);
        let json = serde_json::to_vec_pretty(&record).context("Failed to serialize record")?;
        fs::write(&record_path, json)
            .with_context(|| format!("Failed to write {:?}", record_path))?;
        log::debug!("Saved snapshot blobs for tag {tag} in {:?}", self.dir);
        Ok(())
    }

    /// Reads the record of the current blob trio
    pub fn latest_record(&self) -> Result<LatestRecord> {
        let path = self.dir.join(LATEST_RECORD);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_slice(&bytes).with_context(|| format!("Malformed record {:?}", path))
    }

    /// Reassembles the inference model from the encoder and decoder blobs
    pub fn load_model(&self) -> Result<Seq2Seq> {
        let record = self.latest_record()?;
        let encoder: GruCell = read_blob(&self.dir.join(&record.encoder))?;
        let DecoderWeights { gru, head } = read_blob(&self.dir.join(&record.decoder))?;
        Ok(Seq2Seq {
            encoder,
            decoder: gru,
            head,
        })
    }

    /// Loads the full trainer weight set
    pub fn load_trainer(&self) -> Result<Seq2Seq> {
        let record = self.latest_record()?;
        read_blob(&self.dir.join(&record.trainer))
    }
}

fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).context("Failed to serialize weights")?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {:?}", path))
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    bincode::deserialize(&bytes).with_context(|| format!("Malformed weight blob {:?}", path))
}
