//! Row types of the aligned and signaled pair table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closes of both instruments at a timestamp present in both series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub timestamp: DateTime<Utc>,
    pub close_a: f64,
    pub close_b: f64,
}

impl AlignedRow {
    pub fn spread(&self) -> f64 {
        self.close_a - self.close_b
    }
}

/// An aligned row annotated with the spread, its z-score and the derived flags.
///
/// `long_entry` and `short_entry` are never both true. `exit_signal` is set
/// whenever `|z_score| < threshold`, independent of the entry flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignaledRow {
    pub timestamp: DateTime<Utc>,
    pub close_a: f64,
    pub close_b: f64,
    pub spread: f64,
    pub z_score: f64,
    pub long_entry: bool,
    pub short_entry: bool,
    pub exit_signal: bool,
}
