//! Train/validation partition selector

use std::str::FromStr;

use crate::error::CoreError;

/// Which side of the train/validation partition to address.
///
/// The partition is deterministic: commit identifiers are sorted
/// lexicographically and the training side is the prefix of
/// `floor(fraction * N)` identifiers. For fixed inputs a commit never
/// changes sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    /// Index of the first validation element for `n` sorted identifiers
    pub fn boundary(n: usize, fraction: f64) -> usize {
        (fraction.clamp(0.0, 1.0) * n as f64).floor() as usize
    }

    /// The slice of `items` belonging to this side of the partition
    pub fn partition<'a, T>(&self, items: &'a [T], fraction: f64) -> &'a [T] {
        let boundary = Self::boundary(items.len(), fraction);
        match self {
            Split::Train => &items[..boundary],
            Split::Val => &items[boundary..],
        }
    }
}

impl FromStr for Split {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Split::Train),
            "val" => Ok(Split::Val),
            other => Err(CoreError::InvalidSplit(other.to_string())),
        }
    }
}
