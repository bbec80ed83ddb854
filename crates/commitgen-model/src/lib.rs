//! Commitgen Model - GRU seq2seq translator
//!
//! Three jointly-trained graphs sharing one weight set: an encoder that
//! folds a diff tensor into a latent state, a decoder that maps (state,
//! message-so-far) to next-symbol distributions, and a trainer that
//! composes both for supervised next-token prediction. Snapshots persist
//! the weights per epoch; the predictor runs autoregressive decoding over
//! a fresh diff.

pub mod gru;
pub mod optimizer;
pub mod predict;
pub mod seq2seq;
pub mod snapshot;
pub mod train;

pub use optimizer::Adadelta;
pub use predict::Predictor;
pub use seq2seq::{Seq2Seq, LATENT_DIM};
pub use snapshot::{Snapshot, SnapshotStore};
pub use train::{train, TrainOptions, TrainStats};
