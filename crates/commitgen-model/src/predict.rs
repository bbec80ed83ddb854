//! Autoregressive prediction
//!
//! Encodes a diff once, then repeatedly invokes the decoder graph,
//! feeding each step's distribution back in as the next input, until the
//! arg-max symbol is the end sentinel or the step bound is hit.

use anyhow::Result;
use ndarray::Array1;

use commitgen_data::codec;

use crate::seq2seq::Seq2Seq;
use crate::snapshot::SnapshotStore;

/// Safety bound on generated symbols when the caller gives none
pub const DEFAULT_MAX_LEN: usize = 300;

/// Inference over a loaded encoder/decoder weight pair
#[derive(Debug)]
pub struct Predictor {
    model: Seq2Seq,
}

impl Predictor {
    /// Loads the most recent snapshot matching `selector` (suffix match;
    /// `None` means most recent overall). Fails with a not-found error
    /// when nothing matches.
    pub fn from_store(store: &SnapshotStore, selector: Option<&str>) -> Result<Self> {
        let snapshot = store.latest(selector)?;
        log::info!("Loading model from {:?}", snapshot.path());
        Ok(Self {
            model: snapshot.load_model()?,
        })
    }

    pub fn from_model(model: Seq2Seq) -> Self {
        Self { model }
    }

    /// Generated symbol distributions for `diff`, one row per step.
    ///
    /// The begin-sentinel seed is input, not output; generation stops
    /// after producing the end-sentinel row or `max_len` rows.
    pub fn predict_proba(&self, diff: &[u8], max_len: usize) -> Vec<Array1<f32>> {
        let x = codec::encode_diff(diff, None);
        let mut state = self.model.encode(&x);

        // the 2-row empty-message tensor starts with the begin sentinel
        let seed = codec::encode_msg(&[], None);
        let mut input = seed.row(0).to_owned();

        let mut rows = Vec::new();
        for _ in 0..max_len {
            let (probs, new_state) = self.model.decode_step(input.view(), state.view());
            state = new_state;
            let symbol = codec::decode_symbol(probs.view());
            rows.push(probs.clone());
            input = probs;
            if symbol == codec::SEQ_END {
                break;
            }
        }
        rows
    }

    /// Predicted message bytes for `diff`, sentinels excluded
    pub fn predict(&self, diff: &[u8], max_len: usize) -> Vec<u8> {
        self.predict_proba(diff, max_len)
            .iter()
            .map(|probs| codec::decode_symbol(probs.view()))
            .filter(|&b| b != codec::MSG_BEGIN && b != codec::SEQ_END)
            .collect()
    }
}
