//! Spread signal engine: full-sample z-score and threshold flags.

pub mod stats;
pub mod zscore;

pub use stats::{SpreadStats, StdDevMode};
pub use zscore::{classify, compute_signals, SignalFlags};
