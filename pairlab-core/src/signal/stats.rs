//! Full-sample spread statistics.
//!
//! Mean and standard deviation are taken over the whole spread sample, so
//! every z-score depends on bars after it. This look-ahead is the reference
//! behavior of the strategy and is kept as is; a rolling window would change
//! backtest outcomes.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Relative floor below which a standard deviation counts as zero.
const DEGENERATE_STD_EPS: f64 = 1e-12;

/// Denominator used for the variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdDevMode {
    /// Divide by N - 1.
    #[default]
    Sample,
    /// Divide by N.
    Population,
}

/// Mean and standard deviation of a spread sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl SpreadStats {
    /// Compute statistics over `values`.
    ///
    /// Fails with `DegenerateSeries` when fewer than two values are given or
    /// the deviation is zero relative to the magnitude of the data, so no
    /// NaN or infinite z-score can reach the simulator.
    pub fn compute(values: &[f64], mode: StdDevMode) -> Result<Self, CoreError> {
        let n = values.len();
        if n < 2 {
            return Err(CoreError::DegenerateSeries(format!(
                "need at least 2 rows for a z-score, got {n}"
            )));
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        let denom = match mode {
            StdDevMode::Sample => (n - 1) as f64,
            StdDevMode::Population => n as f64,
        };
        let std_dev = (sum_sq / denom).sqrt();

        let scale = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        if !std_dev.is_finite() || std_dev <= DEGENERATE_STD_EPS * scale {
            return Err(CoreError::DegenerateSeries(format!(
                "spread standard deviation is zero (mean {mean})"
            )));
        }

        Ok(Self {
            count: n,
            mean,
            std_dev,
        })
    }

    /// Standardize a value against these statistics.
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}
