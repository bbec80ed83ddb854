//! Batch assembly with asymmetric padding
//!
//! Diff and message encodings carry their sentinels at opposite ends, so
//! the two tensors are squared off from opposite directions: diffs are
//! padded/truncated at the front (the end sentinel lives in the last row),
//! messages at the back (the begin sentinel lives in the first row).

use ndarray::{s, Array2, Array3};

use crate::codec::ALPHABET;

/// One training step's worth of rectangular tensors.
///
/// `decoder_input` and `decoder_target` are the same padded message
/// tensor shifted by one position for teacher forcing.
#[derive(Debug, Clone)]
pub struct TrainingBatch {
    /// `(N, max_diff_len, 128)`
    pub diffs: Array3<f32>,
    /// `(N, max_msg_len - 1, 128)`
    pub decoder_input: Array3<f32>,
    /// `(N, max_msg_len - 1, 128)`
    pub decoder_target: Array3<f32>,
}

impl TrainingBatch {
    pub fn len(&self) -> usize {
        self.diffs.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Squares a list of variable-length encoded pairs into a [`TrainingBatch`].
///
/// Diffs shorter than `max_diff_len` get all-zero rows prepended; longer
/// ones lose rows from the front. Messages are padded/truncated at the
/// back. The teacher-forcing shift drops the last message position from
/// the decoder input and the first from the target.
pub fn format_batch(
    samples: &[(Array2<f32>, Array2<f32>)],
    max_diff_len: usize,
    max_msg_len: usize,
) -> TrainingBatch {
    let n = samples.len();
    let mut diffs = Array3::zeros((n, max_diff_len, ALPHABET));
    let mut msgs = Array3::zeros((n, max_msg_len, ALPHABET));

    for (i, (diff, msg)) in samples.iter().enumerate() {
        let rows = diff.nrows();
        if rows >= max_diff_len {
            let start = rows - max_diff_len;
            diffs
                .slice_mut(s![i, .., ..])
                .assign(&diff.slice(s![start.., ..]));
        } else {
            let pad = max_diff_len - rows;
            diffs.slice_mut(s![i, pad.., ..]).assign(diff);
        }

        let keep = msg.nrows().min(max_msg_len);
        msgs.slice_mut(s![i, ..keep, ..])
            .assign(&msg.slice(s![..keep, ..]));
    }

    let decoder_input = msgs.slice(s![.., ..max_msg_len - 1, ..]).to_owned();
    let decoder_target = msgs.slice(s![.., 1.., ..]).to_owned();
    TrainingBatch {
        diffs,
        decoder_input,
        decoder_target,
    }
}
