//! One-hot byte codec with sentinel markers
//!
//! Raw message/diff bytes are mapped onto a 128-symbol alphabet: symbol 0
//! marks the beginning of a message, symbol 1 marks the end of any
//! sequence, and symbols 2..=127 carry the byte values. Input bytes are
//! clamped into `[2, 127]` before encoding, and the sentinel positions are
//! stomped afterwards so they stay correct even when the raw input already
//! contained byte 0, 1 or 127 there.

use ndarray::{Array2, ArrayView1};

/// Number of symbols in the alphabet
pub const ALPHABET: usize = 128;

/// Message-begin sentinel (message encodings only)
pub const MSG_BEGIN: u8 = 0;

/// End-of-sequence sentinel (diffs and messages)
pub const SEQ_END: u8 = 1;

const BYTE_MIN: u8 = 2;
const BYTE_MAX: u8 = 127;

fn clamp_symbol(b: u8) -> usize {
    b.clamp(BYTE_MIN, BYTE_MAX) as usize
}

fn truncate(bytes: &[u8], max_len: Option<usize>) -> &[u8] {
    match max_len {
        Some(n) if bytes.len() > n => &bytes[..n],
        _ => bytes,
    }
}

/// Encodes a diff as a `(len + 1, 128)` one-hot tensor.
///
/// The raw input is truncated to `max_len` bytes when a limit is given
/// (`None` reads the entire input), then the end sentinel is appended.
/// Every row sums to exactly 1 and the last row is always the end
/// sentinel.
pub fn encode_diff(bytes: &[u8], max_len: Option<usize>) -> Array2<f32> {
    let bytes = truncate(bytes, max_len);
    let rows = bytes.len() + 1;
    let mut out = Array2::zeros((rows, ALPHABET));
    for (i, &b) in bytes.iter().enumerate() {
        out[[i, clamp_symbol(b)]] = 1.0;
    }
    out[[rows - 1, SEQ_END as usize]] = 1.0;
    out
}

/// Encodes a message as a `(len + 2, 128)` one-hot tensor.
///
/// The begin sentinel is prepended and the end sentinel appended around
/// the (optionally truncated) raw input. An empty input still yields the
/// 2-row begin+end tensor, which doubles as the seed fed to the decoder
/// before any generated character exists.
pub fn encode_msg(bytes: &[u8], max_len: Option<usize>) -> Array2<f32> {
    let bytes = truncate(bytes, max_len);
    let rows = bytes.len() + 2;
    let mut out = Array2::zeros((rows, ALPHABET));
    out[[0, MSG_BEGIN as usize]] = 1.0;
    for (i, &b) in bytes.iter().enumerate() {
        out[[i + 1, clamp_symbol(b)]] = 1.0;
    }
    out[[rows - 1, SEQ_END as usize]] = 1.0;
    out
}

/// Projects a probability row back to its most likely symbol
pub fn decode_symbol(row: ArrayView1<f32>) -> u8 {
    let mut best = 0usize;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in row.iter().enumerate() {
        if v > best_value {
            best_value = v;
            best = i;
        }
    }
    best as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_one_hot_rows(a: &Array2<f32>) {
        for row in a.rows() {
            let sum: f32 = row.sum();
            assert!((sum - 1.0).abs() < 1e-6, "row sums to {sum}, not 1");
        }
    }

    #[test]
    fn test_encode_diff_shape_and_sentinel() {
        let enc = encode_diff(b"abc", None);
        assert_eq!(enc.shape(), &[4, ALPHABET]);
        assert_one_hot_rows(&enc);
        assert_eq!(enc[[3, SEQ_END as usize]], 1.0);
        assert_eq!(enc[[0, b'a' as usize]], 1.0);
    }

    #[test]
    fn test_encode_msg_shape_and_sentinels() {
        let enc = encode_msg(b"hi", None);
        assert_eq!(enc.shape(), &[4, ALPHABET]);
        assert_one_hot_rows(&enc);
        assert_eq!(enc[[0, MSG_BEGIN as usize]], 1.0);
        assert_eq!(enc[[3, SEQ_END as usize]], 1.0);
    }

    #[test]
    fn test_empty_message_yields_seed() {
        let enc = encode_msg(b"", None);
        assert_eq!(enc.shape(), &[2, ALPHABET]);
        assert_eq!(enc[[0, MSG_BEGIN as usize]], 1.0);
        assert_eq!(enc[[1, SEQ_END as usize]], 1.0);
    }

    #[test]
    fn test_clamping() {
        // 0 and 1 collide with the sentinels and get pushed up to 2;
        // anything above 127 folds down to 127.
        let enc = encode_diff(&[0, 1, 127, 200], None);
        assert_eq!(enc[[0, 2]], 1.0);
        assert_eq!(enc[[1, 2]], 1.0);
        assert_eq!(enc[[2, 127]], 1.0);
        assert_eq!(enc[[3, 127]], 1.0);
        assert_eq!(enc[[4, SEQ_END as usize]], 1.0);
        assert_one_hot_rows(&enc);
    }

    #[test]
    fn test_sentinel_forced_after_clamp() {
        // A message whose raw bytes would clamp onto the sentinel rows
        // must still begin with symbol 0 and end with symbol 1.
        let enc = encode_msg(&[1, 0], None);
        assert_eq!(enc[[0, MSG_BEGIN as usize]], 1.0);
        assert_eq!(enc[[1, 2]], 1.0);
        assert_eq!(enc[[2, 2]], 1.0);
        assert_eq!(enc[[3, SEQ_END as usize]], 1.0);
    }

    #[test]
    fn test_truncation() {
        let enc = encode_diff(b"abcdef", Some(2));
        assert_eq!(enc.shape(), &[3, ALPHABET]);
        assert_eq!(enc[[2, SEQ_END as usize]], 1.0);

        let enc = encode_msg(b"abcdef", Some(3));
        assert_eq!(enc.shape(), &[5, ALPHABET]);
        assert_eq!(enc[[0, MSG_BEGIN as usize]], 1.0);
        assert_eq!(enc[[4, SEQ_END as usize]], 1.0);

        // A limit larger than the input changes nothing
        let enc = encode_diff(b"ab", Some(100));
        assert_eq!(enc.shape(), &[3, ALPHABET]);
    }

    #[test]
    fn test_decode_symbol_is_argmax() {
        let enc = encode_msg(b"x", None);
        assert_eq!(decode_symbol(enc.row(0)), MSG_BEGIN);
        assert_eq!(decode_symbol(enc.row(1)), b'x');
        assert_eq!(decode_symbol(enc.row(2)), SEQ_END);
    }
}
