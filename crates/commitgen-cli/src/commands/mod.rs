//! Command implementations

mod clone;
mod humanify;
mod predict;
mod process;
mod stats;
mod train;

pub use clone::cmd_clone;
pub use humanify::cmd_humanify;
pub use predict::cmd_predict;
pub use process::cmd_process;
pub use stats::cmd_stats;
pub use train::cmd_train;
